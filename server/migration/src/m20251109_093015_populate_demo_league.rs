use sea_orm::entity::prelude::{TimeDate, TimeDateTimeWithTimeZone};
use sea_orm::{EntityTrait, Set};
use sea_orm_migration::prelude::*;
use time::macros::{date, time};
use volleyleague_core::schedule::RecurrenceRule;
use volleyleague_db::{
    accounts, acls, common, game_days, season_teams, seasons, team_members, teams,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if std::env::var("VOLLEYLEAGUE_POPULATE_DATABASE").is_err() {
            return Ok(());
        }
        let db = manager.get_connection();
        let now = TimeDateTimeWithTimeZone::now_utc();
        let admin_id = accounts::Entity::insert(accounts::ActiveModel {
            name: Set("admin".to_owned()),
            email: Set(Some("admin@volleyleague.local".to_owned())),
            display_name: Set(Some("League Admin".to_owned())),
            created_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await?
        .last_insert_id;
        acls::grant_admin(db, admin_id).await?;

        let start: TimeDate = date!(2026 - 01 - 02);
        let end: TimeDate = date!(2026 - 03 - 27);
        let rule = RecurrenceRule::new(5, time!(19:00))
            .map_err(|e| DbErr::Custom(format!("Demo season rule: {e}")))?;
        let season_id = seasons::Entity::insert(seasons::ActiveModel {
            name: Set("Winter 2026".to_owned()),
            start_date: Set(start),
            end_date: Set(end),
            day_of_week: Set(rule.day_of_week),
            game_time: Set(rule.time),
            status: Set(seasons::Status::Active),
            created_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await?
        .last_insert_id;
        let dates = rule
            .game_dates(start, end)
            .map_err(|e| DbErr::Custom(format!("Demo season dates: {e}")))?;
        let game_days = dates.map(|d| game_days::ActiveModel {
            season_id: Set(season_id),
            game_date: Set(d),
            created_at: Set(now),
            ..Default::default()
        });
        game_days::Entity::insert_many(game_days).exec(db).await?;

        for name in ["Net Results", "Block Party", "Set Point"] {
            let captain_id = accounts::Entity::insert(accounts::ActiveModel {
                name: Set(name.to_lowercase().replace(' ', "-")),
                email: Set(Some(format!(
                    "{}@volleyleague.local",
                    name.to_lowercase().replace(' ', ".")
                ))),
                created_at: Set(now),
                ..Default::default()
            })
            .exec(db)
            .await?
            .last_insert_id;
            let team_id = teams::Entity::insert(teams::ActiveModel {
                name: Set(name.to_owned()),
                captain_id: Set(captain_id),
                created_at: Set(now),
                ..Default::default()
            })
            .exec(db)
            .await?
            .last_insert_id;
            team_members::Entity::insert(team_members::ActiveModel {
                team_id: Set(team_id),
                account_id: Set(captain_id),
                joined_at: Set(now),
                ..Default::default()
            })
            .exec(db)
            .await?;
            acls::add_owner(db, captain_id, common::EntityKind::Team, team_id).await?;
            season_teams::Entity::insert(season_teams::ActiveModel {
                season_id: Set(season_id),
                team_id: Set(team_id),
                total_sets_won: Set(0),
                total_sets_lost: Set(0),
                ..Default::default()
            })
            .exec(db)
            .await?;
        }
        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}
