use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique, indexed)]
    pub name: String,
    #[sea_orm(unique, indexed)]
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: TimeDateTimeWithTimeZone,
}

impl Model {
    /// Display name, falling back to the account name.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::team_members::Entity")]
    TeamMembers,
    #[sea_orm(has_many = "super::game_day_players::Entity")]
    GameDayPlayers,
}

impl Related<super::team_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMembers.def()
    }
}

impl Related<super::game_day_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameDayPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
