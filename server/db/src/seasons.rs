use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "seasons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub start_date: TimeDate,
    pub end_date: TimeDate,
    // 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub game_time: TimeTime,
    #[sea_orm(indexed)]
    pub status: Status,
    #[sea_orm(indexed)]
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::season_excluded_dates::Entity")]
    SeasonExcludedDates,
    #[sea_orm(has_many = "super::season_teams::Entity")]
    SeasonTeams,
    #[sea_orm(has_many = "super::game_days::Entity")]
    GameDays,
}

impl Related<super::season_excluded_dates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeasonExcludedDates.def()
    }
}

impl Related<super::season_teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeasonTeams.def()
    }
}

impl Related<super::game_days::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameDays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
