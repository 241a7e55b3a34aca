use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "game_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(indexed)]
    pub game_day_id: i64,
    #[sea_orm(indexed)]
    pub team_id: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub recorded_at: TimeDateTimeWithTimeZone,
    pub reported_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::game_days::Entity",
        from = "Column::GameDayId",
        to = "super::game_days::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    GameDays,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::TeamId",
        to = "super::teams::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Teams,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ReportedBy",
        to = "super::accounts::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Reporter,
}

impl Related<super::game_days::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameDays.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
