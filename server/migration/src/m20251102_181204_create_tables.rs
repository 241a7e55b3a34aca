use volleyleague_db::{
    game_day_players, game_days, game_results, prelude::*, season_teams, team_invites,
    team_members,
};
use sea_orm::EntityTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn idx<E: EntityTrait>(s: &sea_orm::Schema, e: E) -> Vec<IndexCreateStatement> {
    s.create_index_from_entity(e)
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, m: &SchemaManager) -> Result<(), DbErr> {
        let s = sea_orm::Schema::new(m.get_database_backend());
        m.create_table(s.create_table_from_entity(Accounts)).await?;
        m.create_table(s.create_table_from_entity(Teams)).await?;
        m.create_table(s.create_table_from_entity(TeamMembers)).await?;
        m.create_table(s.create_table_from_entity(TeamInvites)).await?;
        m.create_table(s.create_table_from_entity(Seasons)).await?;
        m.create_table(s.create_table_from_entity(SeasonExcludedDates))
            .await?;
        m.create_table(s.create_table_from_entity(SeasonTeams)).await?;
        m.create_table(s.create_table_from_entity(GameDays)).await?;
        m.create_table(s.create_table_from_entity(GameResults)).await?;
        m.create_table(s.create_table_from_entity(GameDayPlayers))
            .await?;
        m.create_table(s.create_table_from_entity(Newsletters)).await?;
        let s = &s;
        let all_idx = [
            idx(s, Accounts),
            idx(s, Teams),
            idx(s, TeamMembers),
            idx(s, TeamInvites),
            idx(s, Seasons),
            idx(s, SeasonExcludedDates),
            idx(s, SeasonTeams),
            idx(s, GameDays),
            idx(s, GameResults),
            idx(s, GameDayPlayers),
            idx(s, Newsletters),
        ]
        .into_iter()
        .flatten();
        for i in all_idx {
            m.create_index(i).await?;
        }

        // Upserts and idempotent generation conflict on these.
        m.create_index(
            Index::create()
                .name("team-members-team-account-unique")
                .if_not_exists()
                .table(TeamMembers)
                .col(team_members::Column::TeamId)
                .col(team_members::Column::AccountId)
                .unique()
                .to_owned(),
        )
        .await?;
        m.create_index(
            Index::create()
                .name("team-invites-team-email-unique")
                .if_not_exists()
                .table(TeamInvites)
                .col(team_invites::Column::TeamId)
                .col(team_invites::Column::Email)
                .unique()
                .to_owned(),
        )
        .await?;
        m.create_index(
            Index::create()
                .name("season-teams-season-team-unique")
                .if_not_exists()
                .table(SeasonTeams)
                .col(season_teams::Column::SeasonId)
                .col(season_teams::Column::TeamId)
                .unique()
                .to_owned(),
        )
        .await?;
        m.create_index(
            Index::create()
                .name("game-days-season-date-unique")
                .if_not_exists()
                .table(GameDays)
                .col(game_days::Column::SeasonId)
                .col(game_days::Column::GameDate)
                .unique()
                .to_owned(),
        )
        .await?;
        m.create_index(
            Index::create()
                .name("game-results-game-day-team-unique")
                .if_not_exists()
                .table(GameResults)
                .col(game_results::Column::GameDayId)
                .col(game_results::Column::TeamId)
                .unique()
                .to_owned(),
        )
        .await?;
        m.create_index(
            Index::create()
                .name("game-day-players-unique")
                .if_not_exists()
                .table(GameDayPlayers)
                .col(game_day_players::Column::GameDayId)
                .col(game_day_players::Column::TeamId)
                .col(game_day_players::Column::AccountId)
                .unique()
                .to_owned(),
        )
        .await?;
        Ok(())
    }

    async fn down(&self, m: &SchemaManager) -> Result<(), DbErr> {
        m.drop_table(Table::drop().table(Newsletters).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop newsletters"))?;
        m.drop_table(Table::drop().table(GameDayPlayers).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop game_day_players"))?;
        m.drop_table(Table::drop().table(GameResults).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop game_results"))?;
        m.drop_table(Table::drop().table(GameDays).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop game_days"))?;
        m.drop_table(Table::drop().table(SeasonTeams).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop season_teams"))?;
        m.drop_table(
            Table::drop()
                .table(SeasonExcludedDates)
                .if_exists()
                .to_owned(),
        )
        .await
        .inspect_err(log_err("drop season_excluded_dates"))?;
        m.drop_table(Table::drop().table(Seasons).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop seasons"))?;
        m.drop_table(Table::drop().table(TeamInvites).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop team_invites"))?;
        m.drop_table(Table::drop().table(TeamMembers).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop team_members"))?;
        m.drop_table(Table::drop().table(Teams).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop teams"))?;
        m.drop_table(Table::drop().table(Accounts).if_exists().to_owned())
            .await
            .inspect_err(log_err("drop accounts"))?;
        Ok(())
    }
}

fn log_err<'a>(ctx: &'a str) -> impl FnOnce(&DbErr) + 'a {
    move |e| {
        eprintln!("{ctx}: {e}");
    }
}
