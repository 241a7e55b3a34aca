pub use sea_orm_migration::prelude::*;

mod m20251102_181204_create_tables;
mod m20251102_181733_create_acls_table;
mod m20251109_093015_populate_demo_league;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251102_181204_create_tables::Migration),
            Box::new(m20251102_181733_create_acls_table::Migration),
            Box::new(m20251109_093015_populate_demo_league::Migration),
        ]
    }
}
