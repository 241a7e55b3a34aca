use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "game_days")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(indexed)]
    pub season_id: i64,
    #[sea_orm(indexed)]
    pub game_date: TimeDate,
    pub description: Option<String>,
    // Points into external object storage; never fetched by the server.
    pub image_url: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::seasons::Entity",
        from = "Column::SeasonId",
        to = "super::seasons::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Seasons,
    #[sea_orm(has_many = "super::game_results::Entity")]
    GameResults,
    #[sea_orm(has_many = "super::game_day_players::Entity")]
    GameDayPlayers,
}

impl Related<super::seasons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seasons.def()
    }
}

impl Related<super::game_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameResults.def()
    }
}

impl Related<super::game_day_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameDayPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
