use derive_more::Display;
use sea_orm::prelude::{TimeDate, TimeDateTimeWithTimeZone, TimeTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionError, TransactionTrait,
};
use sea_query::{Expr, OnConflict};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use std::collections::{BTreeSet, HashMap, HashSet};

use volleyleague_core::schedule::{self, RecurrenceRule};
use volleyleague_core::standings::{
    self, LeaderboardEntry, Participation, ResultRow, SetTally, TeamRecord, TeamStanding,
};
use volleyleague_db as db;

use crate::acl::{self, Requester};
use crate::validation;

#[derive(Debug)]
pub struct MyDbError {
    pub context: String,
    pub db_error: DbErr,
}

impl std::fmt::Display for MyDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.context, self.db_error)
    }
}

impl std::error::Error for MyDbError {}

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{_0}")]
    InvalidInput(String),

    #[display(fmt = "{_0}")]
    NotFound(String),

    #[display(fmt = "{_0}")]
    Conflict(String),

    #[display(fmt = "Access denied.")]
    Denied,

    #[display(fmt = "{_0}")]
    Db(MyDbError),
}

impl std::error::Error for Error {}

impl From<volleyleague_core::Error> for Error {
    fn from(e: volleyleague_core::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl From<acl::Error> for Error {
    fn from(e: acl::Error) -> Self {
        match e {
            acl::Error::Denied => Error::Denied,
            acl::Error::InvalidArgument(s) => Error::InvalidInput(s),
            acl::Error::DbErr(db_error) => Error::Db(MyDbError {
                context: "ACL check failed".to_owned(),
                db_error,
            }),
        }
    }
}

pub(crate) fn db_err(context: impl Into<String>) -> impl FnOnce(DbErr) -> Error {
    let context = context.into();
    move |db_error| Error::Db(MyDbError { context, db_error })
}

pub(crate) fn txn_err(context: impl Into<String>) -> impl FnOnce(TransactionError<Error>) -> Error {
    let context = context.into();
    move |e| match e {
        TransactionError::Connection(db_error) => Error::Db(MyDbError { context, db_error }),
        TransactionError::Transaction(e) => e,
    }
}

// Seasons.

pub fn status_str(status: db::seasons::Status) -> &'static str {
    match status {
        db::seasons::Status::Draft => "draft",
        db::seasons::Status::Active => "active",
        db::seasons::Status::Completed => "completed",
    }
}

pub fn parse_status(status: &str) -> Result<db::seasons::Status, Error> {
    match status {
        "draft" => Ok(db::seasons::Status::Draft),
        "active" => Ok(db::seasons::Status::Active),
        "completed" => Ok(db::seasons::Status::Completed),
        s => Err(Error::InvalidInput(format!(
            "Unknown season status {s:?}, want draft, active or completed"
        ))),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SeasonSummary {
    pub id: i64,
    pub name: String,
    pub start_date: TimeDate,
    pub end_date: TimeDate,
    pub day_of_week: u8,
    pub game_time: TimeTime,
    pub status: &'static str,
}

impl From<&db::seasons::Model> for SeasonSummary {
    fn from(s: &db::seasons::Model) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            start_date: s.start_date,
            end_date: s.end_date,
            day_of_week: s.day_of_week,
            game_time: s.game_time,
            status: status_str(s.status),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewSeason {
    pub name: String,
    pub start_date: TimeDate,
    pub end_date: TimeDate,
    pub day_of_week: u8,
    pub game_time: TimeTime,
    #[serde(default)]
    pub exclude_dates: BTreeSet<TimeDate>,
}

pub async fn create_season<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    season: NewSeason,
) -> Result<db::seasons::Model, Error> {
    validation::validate_season_name(&season.name).map_err(Error::InvalidInput)?;
    if season.start_date > season.end_date {
        return Err(Error::InvalidInput(format!(
            "Season starts {} after it ends {}",
            season.start_date, season.end_date
        )));
    }
    schedule::weekday(season.day_of_week)?;
    let created = db
        .transaction::<_, db::seasons::Model, Error>(|txn| {
            Box::pin(async move {
                let model = db::seasons::ActiveModel {
                    name: Set(season.name),
                    start_date: Set(season.start_date),
                    end_date: Set(season.end_date),
                    day_of_week: Set(season.day_of_week),
                    game_time: Set(season.game_time),
                    status: Set(db::seasons::Status::Draft),
                    created_at: Set(TimeDateTimeWithTimeZone::now_utc()),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err("Failed to insert season"))?;
                if !season.exclude_dates.is_empty() {
                    let id = model.id;
                    let excluded = season.exclude_dates.into_iter().map(|date| {
                        db::season_excluded_dates::ActiveModel {
                            season_id: Set(id),
                            date: Set(date),
                        }
                    });
                    db::season_excluded_dates::Entity::insert_many(excluded)
                        .exec_without_returning(txn)
                        .await
                        .map_err(db_err(format!("Failed to insert excluded dates of season {id}")))?;
                }
                Ok(model)
            })
        })
        .await
        .map_err(txn_err("Failed to create season"))?;
    log::info!("Created season {} {:?}", created.id, created.name);
    Ok(created)
}

async fn find_season<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<db::seasons::Model, Error> {
    db::seasons::Entity::find_by_id(season_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch season {season_id}")))?
        .ok_or_else(|| Error::NotFound(format!("Season {season_id} not found")))
}

/// The season together with its stored recurrence rule.
pub async fn load_season<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<(db::seasons::Model, RecurrenceRule), Error> {
    let season = find_season(db, season_id).await?;
    let exclude_dates = db::season_excluded_dates::Entity::find()
        .filter(db::season_excluded_dates::Column::SeasonId.eq(season_id))
        .all(db)
        .await
        .map_err(db_err(format!(
            "Failed to fetch excluded dates of season {season_id}"
        )))?
        .into_iter()
        .map(|d| d.date)
        .collect();
    let rule = RecurrenceRule {
        day_of_week: season.day_of_week,
        time: season.game_time,
        exclude_dates,
    };
    Ok((season, rule))
}

pub async fn list_seasons<C: ConnectionTrait>(db: &C) -> Result<Vec<db::seasons::Model>, Error> {
    db::seasons::Entity::find()
        .order_by_desc(db::seasons::Column::CreatedAt)
        .order_by_desc(db::seasons::Column::Id)
        .all(db)
        .await
        .map_err(db_err("Failed to list seasons"))
}

/// The active season if there is one, else the most recently created.
pub async fn default_season<C: ConnectionTrait>(
    db: &C,
) -> Result<Option<db::seasons::Model>, Error> {
    let seasons = list_seasons(db).await?;
    let active = seasons
        .iter()
        .position(|s| s.status == db::seasons::Status::Active);
    Ok(match active {
        Some(i) => seasons.into_iter().nth(i),
        None => seasons.into_iter().next(),
    })
}

pub async fn set_season_status<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
    status: db::seasons::Status,
) -> Result<db::seasons::Model, Error> {
    let season = find_season(db, season_id).await?;
    let mut season: db::seasons::ActiveModel = season.into();
    season.status = Set(status);
    let season = season
        .update(db)
        .await
        .map_err(db_err(format!("Failed to update status of season {season_id}")))?;
    log::info!("Season {season_id} is now {}", status_str(status));
    Ok(season)
}

/// Replaces the season's teams. Teams that stay keep their tallies.
pub async fn set_season_teams<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    season_id: i64,
    team_ids: Vec<i64>,
) -> Result<Vec<db::season_teams::Model>, Error> {
    let wanted = team_ids.into_iter().collect::<BTreeSet<i64>>();
    db.transaction::<_, Vec<db::season_teams::Model>, Error>(|txn| {
        Box::pin(async move {
            find_season(txn, season_id).await?;
            if !wanted.is_empty() {
                let known = db::teams::Entity::find()
                    .filter(db::teams::Column::Id.is_in(wanted.iter().copied()))
                    .select_only()
                    .column(db::teams::Column::Id)
                    .into_values::<i64, db::teams::Column>()
                    .all(txn)
                    .await
                    .map_err(db_err("Failed to fetch teams"))?
                    .into_iter()
                    .collect::<BTreeSet<i64>>();
                if let Some(unknown) = wanted.difference(&known).next() {
                    return Err(Error::NotFound(format!("Team {unknown} not found")));
                }
            }
            let existing = season_team_rows(txn, season_id)
                .await?
                .into_iter()
                .map(|st| st.team_id)
                .collect::<BTreeSet<i64>>();
            let removed = existing.difference(&wanted).copied().collect::<Vec<_>>();
            if !removed.is_empty() {
                db::season_teams::Entity::delete_many()
                    .filter(
                        Condition::all()
                            .add(db::season_teams::Column::SeasonId.eq(season_id))
                            .add(db::season_teams::Column::TeamId.is_in(removed)),
                    )
                    .exec(txn)
                    .await
                    .map_err(db_err(format!(
                        "Failed to remove teams from season {season_id}"
                    )))?;
            }
            let added = wanted
                .difference(&existing)
                .map(|&team_id| db::season_teams::ActiveModel {
                    season_id: Set(season_id),
                    team_id: Set(team_id),
                    total_sets_won: Set(0),
                    total_sets_lost: Set(0),
                    ..Default::default()
                })
                .collect::<Vec<_>>();
            if !added.is_empty() {
                db::season_teams::Entity::insert_many(added)
                    .exec_without_returning(txn)
                    .await
                    .map_err(db_err(format!("Failed to add teams to season {season_id}")))?;
            }
            season_team_rows(txn, season_id).await
        })
    })
    .await
    .map_err(txn_err(format!("Failed to set teams of season {season_id}")))
}

async fn season_team_rows<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<Vec<db::season_teams::Model>, Error> {
    db::season_teams::Entity::find()
        .filter(db::season_teams::Column::SeasonId.eq(season_id))
        .order_by_asc(db::season_teams::Column::Id)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch teams of season {season_id}")))
}

/// Inserts the season's game days that do not exist yet and returns them.
/// Running it twice inserts nothing the second time.
pub async fn generate_game_days<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    season_id: i64,
) -> Result<Vec<db::game_days::Model>, Error> {
    let inserted = db
        .transaction::<_, Vec<db::game_days::Model>, Error>(|txn| {
            Box::pin(async move {
                let (season, rule) = load_season(txn, season_id).await?;
                let existing = db::game_days::Entity::find()
                    .filter(db::game_days::Column::SeasonId.eq(season_id))
                    .select_only()
                    .column(db::game_days::Column::GameDate)
                    .into_values::<TimeDate, db::game_days::Column>()
                    .all(txn)
                    .await
                    .map_err(db_err(format!(
                        "Failed to fetch game days of season {season_id}"
                    )))?
                    .into_iter()
                    .collect::<HashSet<TimeDate>>();
                let missing = rule
                    .game_dates(season.start_date, season.end_date)?
                    .filter(|d| !existing.contains(d))
                    .collect::<Vec<_>>();
                if missing.is_empty() {
                    return Ok(vec![]);
                }
                let now = TimeDateTimeWithTimeZone::now_utc();
                let game_days = missing.iter().map(|&d| db::game_days::ActiveModel {
                    season_id: Set(season_id),
                    game_date: Set(d),
                    created_at: Set(now),
                    ..Default::default()
                });
                db::game_days::Entity::insert_many(game_days)
                    .exec_without_returning(txn)
                    .await
                    .map_err(db_err(format!(
                        "Failed to insert game days of season {season_id}"
                    )))?;
                db::game_days::Entity::find()
                    .filter(
                        Condition::all()
                            .add(db::game_days::Column::SeasonId.eq(season_id))
                            .add(db::game_days::Column::GameDate.is_in(missing)),
                    )
                    .order_by_asc(db::game_days::Column::GameDate)
                    .all(txn)
                    .await
                    .map_err(db_err(format!(
                        "Failed to fetch generated game days of season {season_id}"
                    )))
            })
        })
        .await
        .map_err(txn_err(format!(
            "Failed to generate game days of season {season_id}"
        )))?;
    log::info!(
        "Generated {} game days for season {season_id}",
        inserted.len()
    );
    Ok(inserted)
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GameDayUpdate {
    pub description: Option<String>,
    pub image_url: Option<String>,
}

pub async fn edit_game_day<C: ConnectionTrait>(
    db: &C,
    game_day_id: i64,
    update: GameDayUpdate,
) -> Result<db::game_days::Model, Error> {
    let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
    let description = non_empty(update.description);
    let image_url = non_empty(update.image_url);
    if let Some(d) = &description {
        validation::validate_description(d).map_err(Error::InvalidInput)?;
    }
    if let Some(u) = &image_url {
        validation::validate_image_url(u).map_err(Error::InvalidInput)?;
    }
    let game_day = find_game_day(db, game_day_id).await?;
    let mut game_day: db::game_days::ActiveModel = game_day.into();
    game_day.description = Set(description);
    game_day.image_url = Set(image_url);
    game_day
        .update(db)
        .await
        .map_err(db_err(format!("Failed to update game day {game_day_id}")))
}

async fn find_game_day<C: ConnectionTrait>(
    db: &C,
    game_day_id: i64,
) -> Result<db::game_days::Model, Error> {
    db::game_days::Entity::find_by_id(game_day_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch game day {game_day_id}")))?
        .ok_or_else(|| Error::NotFound(format!("Game day {game_day_id} not found")))
}

/// Deletes the season with everything hanging off it.
pub async fn delete_season<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    season_id: i64,
) -> Result<(), Error> {
    db.transaction::<_, (), Error>(|txn| {
        Box::pin(async move {
            find_season(txn, season_id).await?;
            let game_day_ids = db::game_days::Entity::find()
                .filter(db::game_days::Column::SeasonId.eq(season_id))
                .select_only()
                .column(db::game_days::Column::Id)
                .into_values::<i64, db::game_days::Column>()
                .all(txn)
                .await
                .map_err(db_err(format!(
                    "Failed to fetch game days of season {season_id}"
                )))?;
            if !game_day_ids.is_empty() {
                db::game_day_players::Entity::delete_many()
                    .filter(db::game_day_players::Column::GameDayId.is_in(game_day_ids.clone()))
                    .exec(txn)
                    .await
                    .map_err(db_err("Failed to delete game day players"))?;
                db::game_results::Entity::delete_many()
                    .filter(db::game_results::Column::GameDayId.is_in(game_day_ids))
                    .exec(txn)
                    .await
                    .map_err(db_err("Failed to delete game results"))?;
            }
            db::game_days::Entity::delete_many()
                .filter(db::game_days::Column::SeasonId.eq(season_id))
                .exec(txn)
                .await
                .map_err(db_err("Failed to delete game days"))?;
            db::season_teams::Entity::delete_many()
                .filter(db::season_teams::Column::SeasonId.eq(season_id))
                .exec(txn)
                .await
                .map_err(db_err("Failed to delete season teams"))?;
            db::season_excluded_dates::Entity::delete_many()
                .filter(db::season_excluded_dates::Column::SeasonId.eq(season_id))
                .exec(txn)
                .await
                .map_err(db_err("Failed to delete excluded dates"))?;
            db::seasons::Entity::delete_by_id(season_id)
                .exec(txn)
                .await
                .map_err(db_err("Failed to delete season"))?;
            Ok(())
        })
    })
    .await
    .map_err(txn_err(format!("Failed to delete season {season_id}")))?;
    log::info!("Deleted season {season_id}");
    Ok(())
}

// Schedules.

#[derive(Clone, Debug, Serialize)]
pub struct ScheduledGameDay {
    pub id: i64,
    pub game_date: TimeDate,
    pub kickoff: PrimitiveDateTime,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// False if the date is not one the season's rule produces.
    pub on_schedule: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SeasonSchedule {
    pub season: SeasonSummary,
    pub game_days: Vec<ScheduledGameDay>,
}

pub async fn season_schedule<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<SeasonSchedule, Error> {
    let (season, rule) = load_season(db, season_id).await?;
    let game_days = db::game_days::Entity::find()
        .filter(db::game_days::Column::SeasonId.eq(season_id))
        .order_by_asc(db::game_days::Column::GameDate)
        .all(db)
        .await
        .map_err(db_err(format!(
            "Failed to fetch game days of season {season_id}"
        )))?;
    let mut scheduled = Vec::with_capacity(game_days.len());
    for gd in game_days {
        let on_schedule = rule.matches(gd.game_date, season.start_date, season.end_date)?;
        if !on_schedule {
            log::warn!(
                "Game day {} on {} is off the schedule of season {season_id}",
                gd.id,
                gd.game_date
            );
        }
        scheduled.push(ScheduledGameDay {
            id: gd.id,
            game_date: gd.game_date,
            kickoff: rule.kickoff(gd.game_date),
            description: gd.description,
            image_url: gd.image_url,
            on_schedule,
        });
    }
    Ok(SeasonSchedule {
        season: SeasonSummary::from(&season),
        game_days: scheduled,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct UpcomingGameDay {
    pub game_day_id: i64,
    pub season_id: i64,
    pub season_name: String,
    pub game_date: TimeDate,
    pub kickoff: PrimitiveDateTime,
    pub description: Option<String>,
}

/// Game days on or after `today` of seasons that are not completed.
pub async fn upcoming_game_days<C: ConnectionTrait>(
    db: &C,
    today: TimeDate,
    limit: u64,
) -> Result<Vec<UpcomingGameDay>, Error> {
    let rows = db::game_days::Entity::find()
        .find_also_related(db::seasons::Entity)
        .filter(
            Condition::all()
                .add(db::game_days::Column::GameDate.gte(today))
                .add(db::seasons::Column::Status.ne(db::seasons::Status::Completed)),
        )
        .order_by_asc(db::game_days::Column::GameDate)
        .order_by_asc(db::game_days::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch game days after {today}")))?;
    Ok(rows
        .into_iter()
        .filter_map(|(gd, season)| {
            let season = season?;
            Some(UpcomingGameDay {
                game_day_id: gd.id,
                season_id: season.id,
                season_name: season.name,
                game_date: gd.game_date,
                kickoff: gd.game_date.with_time(season.game_time),
                description: gd.description,
            })
        })
        .collect())
}

// Results.

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResultEntry {
    pub team_id: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    /// Replaces who played for the team on the day when given.
    #[serde(default)]
    pub players: Option<Vec<i64>>,
}

/// Records one team's result for a game day. Requires write on the team.
pub async fn record_result<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    requester: Requester,
    game_day_id: i64,
    entry: ResultEntry,
) -> Result<db::game_results::Model, Error> {
    acl::check(
        db,
        requester,
        db::acls::AccessType::Write,
        db::common::EntityKind::Team,
        Some(entry.team_id),
    )
    .await?;
    let reported_by = requester.account_id();
    let stored = db
        .transaction::<_, db::game_results::Model, Error>(|txn| {
            Box::pin(async move {
                let game_day =
                    validate_results(txn, game_day_id, std::slice::from_ref(&entry)).await?;
                store_result(txn, &game_day, &entry, reported_by).await
            })
        })
        .await
        .map_err(txn_err(format!(
            "Failed to record result for game day {game_day_id}"
        )))?;
    log::info!(
        "Recorded {}-{} for team {} on game day {game_day_id} by {requester:?}",
        stored.sets_won,
        stored.sets_lost,
        stored.team_id
    );
    Ok(stored)
}

/// Records many teams' results for one game day at once.
pub async fn record_game_day_results<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    requester: Requester,
    game_day_id: i64,
    entries: Vec<ResultEntry>,
) -> Result<Vec<db::game_results::Model>, Error> {
    acl::check(
        db,
        requester,
        db::acls::AccessType::Write,
        db::common::EntityKind::GameDay,
        Some(game_day_id),
    )
    .await?;
    if entries.is_empty() {
        return Err(Error::InvalidInput("No results given".to_owned()));
    }
    let reported_by = requester.account_id();
    let stored = db
        .transaction::<_, Vec<db::game_results::Model>, Error>(|txn| {
            Box::pin(async move {
                let game_day = validate_results(txn, game_day_id, &entries).await?;
                let mut stored = Vec::with_capacity(entries.len());
                for entry in entries.iter() {
                    stored.push(store_result(txn, &game_day, entry, reported_by).await?);
                }
                Ok(stored)
            })
        })
        .await
        .map_err(txn_err(format!(
            "Failed to record results for game day {game_day_id}"
        )))?;
    log::info!(
        "Recorded {} results on game day {game_day_id} by {requester:?}",
        stored.len()
    );
    Ok(stored)
}

async fn validate_results<C: ConnectionTrait>(
    db: &C,
    game_day_id: i64,
    entries: &[ResultEntry],
) -> Result<db::game_days::Model, Error> {
    let mut teams = HashSet::with_capacity(entries.len());
    for e in entries {
        SetTally::for_result(e.sets_won, e.sets_lost)?;
        if !teams.insert(e.team_id) {
            return Err(Error::InvalidInput(format!(
                "Team {} has more than one result",
                e.team_id
            )));
        }
    }
    let game_day = find_game_day(db, game_day_id).await?;
    let season_teams = season_team_rows(db, game_day.season_id)
        .await?
        .into_iter()
        .map(|st| st.team_id)
        .collect::<HashSet<i64>>();
    for e in entries {
        if !season_teams.contains(&e.team_id) {
            return Err(Error::InvalidInput(format!(
                "Team {} does not play in season {}",
                e.team_id, game_day.season_id
            )));
        }
        let Some(players) = &e.players else {
            continue;
        };
        let members = crate::roster::member_ids(db, e.team_id).await?;
        if let Some(p) = players.iter().find(|p| !members.contains(p)) {
            return Err(Error::InvalidInput(format!(
                "Account {p} is not a member of team {}",
                e.team_id
            )));
        }
    }
    Ok(game_day)
}

// Upsert keyed on (game day, team), then the season tally is rebuilt from
// raw results so it never drifts from them.
async fn store_result<C: ConnectionTrait>(
    txn: &C,
    game_day: &db::game_days::Model,
    entry: &ResultEntry,
    reported_by: Option<i64>,
) -> Result<db::game_results::Model, Error> {
    let game_day_id = game_day.id;
    let team_id = entry.team_id;
    db::game_results::Entity::insert(db::game_results::ActiveModel {
        game_day_id: Set(game_day_id),
        team_id: Set(team_id),
        sets_won: Set(entry.sets_won),
        sets_lost: Set(entry.sets_lost),
        recorded_at: Set(TimeDateTimeWithTimeZone::now_utc()),
        reported_by: Set(reported_by),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            db::game_results::Column::GameDayId,
            db::game_results::Column::TeamId,
        ])
        .update_columns([
            db::game_results::Column::SetsWon,
            db::game_results::Column::SetsLost,
            db::game_results::Column::RecordedAt,
            db::game_results::Column::ReportedBy,
        ])
        .to_owned(),
    )
    .exec_without_returning(txn)
    .await
    .map_err(db_err(format!(
        "Failed to upsert result of team {team_id} on game day {game_day_id}"
    )))?;
    if let Some(players) = &entry.players {
        replace_players(txn, game_day_id, team_id, players).await?;
    }
    refresh_team_tally(txn, game_day.season_id, team_id).await?;
    db::game_results::Entity::find()
        .filter(
            Condition::all()
                .add(db::game_results::Column::GameDayId.eq(game_day_id))
                .add(db::game_results::Column::TeamId.eq(team_id)),
        )
        .one(txn)
        .await
        .map_err(db_err("Failed to fetch stored result"))?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Result of team {team_id} on game day {game_day_id} vanished"
            ))
        })
}

async fn replace_players<C: ConnectionTrait>(
    txn: &C,
    game_day_id: i64,
    team_id: i64,
    players: &[i64],
) -> Result<(), Error> {
    db::game_day_players::Entity::delete_many()
        .filter(
            Condition::all()
                .add(db::game_day_players::Column::GameDayId.eq(game_day_id))
                .add(db::game_day_players::Column::TeamId.eq(team_id)),
        )
        .exec(txn)
        .await
        .map_err(db_err(format!(
            "Failed to clear players of team {team_id} on game day {game_day_id}"
        )))?;
    let players = players.iter().copied().collect::<BTreeSet<i64>>();
    if players.is_empty() {
        return Ok(());
    }
    let now = TimeDateTimeWithTimeZone::now_utc();
    let rows = players
        .into_iter()
        .map(|account_id| db::game_day_players::ActiveModel {
            game_day_id: Set(game_day_id),
            team_id: Set(team_id),
            account_id: Set(account_id),
            created_at: Set(now),
            ..Default::default()
        });
    db::game_day_players::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await
        .map_err(db_err(format!(
            "Failed to store players of team {team_id} on game day {game_day_id}"
        )))?;
    Ok(())
}

async fn season_results<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
    team_id: Option<i64>,
) -> Result<Vec<ResultRow>, Error> {
    let mut filter = Condition::all().add(db::game_days::Column::SeasonId.eq(season_id));
    if let Some(team_id) = team_id {
        filter = filter.add(db::game_results::Column::TeamId.eq(team_id));
    }
    Ok(db::game_results::Entity::find()
        .join(
            sea_orm::JoinType::InnerJoin,
            db::game_results::Relation::GameDays.def(),
        )
        .filter(filter)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch results of season {season_id}")))?
        .into_iter()
        .map(result_row)
        .collect())
}

fn result_row(r: db::game_results::Model) -> ResultRow {
    ResultRow {
        game_day_id: r.game_day_id,
        team_id: r.team_id,
        sets_won: r.sets_won,
        sets_lost: r.sets_lost,
    }
}

async fn refresh_team_tally<C: ConnectionTrait>(
    txn: &C,
    season_id: i64,
    team_id: i64,
) -> Result<SetTally, Error> {
    let results = season_results(txn, season_id, Some(team_id)).await?;
    let tally = standings::tally_by_team(&results)?
        .get(&team_id)
        .copied()
        .unwrap_or_default();
    write_tally(txn, season_id, team_id, tally).await?;
    Ok(tally)
}

async fn write_tally<C: ConnectionTrait>(
    txn: &C,
    season_id: i64,
    team_id: i64,
    tally: SetTally,
) -> Result<(), Error> {
    let res = db::season_teams::Entity::update_many()
        .col_expr(db::season_teams::Column::TotalSetsWon, Expr::value(tally.won))
        .col_expr(
            db::season_teams::Column::TotalSetsLost,
            Expr::value(tally.lost),
        )
        .filter(
            Condition::all()
                .add(db::season_teams::Column::SeasonId.eq(season_id))
                .add(db::season_teams::Column::TeamId.eq(team_id)),
        )
        .exec(txn)
        .await
        .map_err(db_err(format!(
            "Failed to update tally of team {team_id} in season {season_id}"
        )))?;
    if res.rows_affected == 0 {
        return Err(Error::InvalidInput(format!(
            "Team {team_id} does not play in season {season_id}"
        )));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TallyCorrection {
    pub team_id: i64,
    pub stored: SetTally,
    pub derived: SetTally,
}

/// Rebuilds every stored tally of the season from raw results and
/// returns the ones that were off.
pub async fn recalculate_season_tallies<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    season_id: i64,
) -> Result<Vec<TallyCorrection>, Error> {
    let corrections = db
        .transaction::<_, Vec<TallyCorrection>, Error>(|txn| {
            Box::pin(async move {
                find_season(txn, season_id).await?;
                let results = season_results(txn, season_id, None).await?;
                let derived = standings::tally_by_team(&results)?;
                let mut corrections = vec![];
                for st in season_team_rows(txn, season_id).await? {
                    let stored = SetTally {
                        won: st.total_sets_won,
                        lost: st.total_sets_lost,
                    };
                    let want = derived.get(&st.team_id).copied().unwrap_or_default();
                    if stored != want {
                        write_tally(txn, season_id, st.team_id, want).await?;
                        corrections.push(TallyCorrection {
                            team_id: st.team_id,
                            stored,
                            derived: want,
                        });
                    }
                }
                Ok(corrections)
            })
        })
        .await
        .map_err(txn_err(format!(
            "Failed to recalculate tallies of season {season_id}"
        )))?;
    log::info!(
        "Recalculated tallies of season {season_id}: {} corrected",
        corrections.len()
    );
    Ok(corrections)
}

// Standings.

#[derive(Clone, Debug, Serialize)]
pub struct SeasonStandings {
    pub season: SeasonSummary,
    pub standings: Vec<TeamStanding>,
}

async fn season_team_names<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<Vec<(db::season_teams::Model, String)>, Error> {
    Ok(db::season_teams::Entity::find()
        .find_also_related(db::teams::Entity)
        .filter(db::season_teams::Column::SeasonId.eq(season_id))
        .order_by_asc(db::season_teams::Column::Id)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch teams of season {season_id}")))?
        .into_iter()
        .map(|(st, team)| (st, team.map(|t| t.name).unwrap_or_default()))
        .collect())
}

/// Ranked from the stored per-season tallies.
pub async fn season_standings<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<SeasonStandings, Error> {
    let season = find_season(db, season_id).await?;
    let records = season_team_names(db, season_id)
        .await?
        .into_iter()
        .map(|(st, team_name)| TeamRecord {
            team_id: st.team_id,
            team_name,
            sets_won: st.total_sets_won,
            sets_lost: st.total_sets_lost,
        });
    Ok(SeasonStandings {
        season: SeasonSummary::from(&season),
        standings: standings::rank_teams(records)?,
    })
}

/// Ranked from raw results, ignoring the stored tallies.
pub async fn derived_season_standings<C: ConnectionTrait>(
    db: &C,
    season_id: i64,
) -> Result<SeasonStandings, Error> {
    let season = find_season(db, season_id).await?;
    let teams = season_team_names(db, season_id)
        .await?
        .into_iter()
        .map(|(st, name)| (st.team_id, name));
    let results = season_results(db, season_id, None).await?;
    let records = standings::team_records_from_results(teams, &results)?;
    Ok(SeasonStandings {
        season: SeasonSummary::from(&season),
        standings: standings::rank_teams(records)?,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardRow {
    pub name: String,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

#[derive(Clone, Debug, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardRow>,
    pub most_sets_won: Option<LeaderboardRow>,
}

/// All-time player ranking over every recorded result.
pub async fn leaderboard<C: ConnectionTrait>(db: &C, limit: usize) -> Result<Leaderboard, Error> {
    let results = db::game_results::Entity::find()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch game results"))?
        .into_iter()
        .map(result_row)
        .collect::<Vec<_>>();
    let participations = db::game_day_players::Entity::find()
        .all(db)
        .await
        .map_err(db_err("Failed to fetch game day players"))?
        .into_iter()
        .map(|p| Participation {
            game_day_id: p.game_day_id,
            team_id: p.team_id,
            account_id: p.account_id,
        })
        .collect::<Vec<_>>();
    let team_ids = participations
        .iter()
        .map(|p| p.team_id)
        .collect::<BTreeSet<_>>();
    let team_names = db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in(team_ids))
        .all(db)
        .await
        .map_err(db_err("Failed to fetch team names"))?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect::<HashMap<i64, String>>();
    let mut entries = standings::aggregate_leaderboard(&results, &participations, &team_names)?;
    entries.truncate(limit);
    let names = account_names(db, entries.iter().map(|e| e.account_id)).await?;
    let entries = entries
        .into_iter()
        .map(|entry| LeaderboardRow {
            name: names.get(&entry.account_id).cloned().unwrap_or_default(),
            entry,
        })
        .collect::<Vec<_>>();
    let most_sets_won = {
        let plain = entries.iter().map(|r| r.entry.clone()).collect::<Vec<_>>();
        standings::most_sets_won(&plain)
            .and_then(|best| entries.iter().find(|r| r.entry.account_id == best.account_id))
            .cloned()
    };
    Ok(Leaderboard {
        entries,
        most_sets_won,
    })
}

pub(crate) async fn account_names<C: ConnectionTrait>(
    db: &C,
    ids: impl Iterator<Item = i64>,
) -> Result<HashMap<i64, String>, Error> {
    let ids = ids.collect::<BTreeSet<_>>();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(db::accounts::Entity::find()
        .filter(db::accounts::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(db_err("Failed to fetch account names"))?
        .into_iter()
        .map(|a| (a.id, a.shown_name().to_owned()))
        .collect())
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use sea_orm::DatabaseConnection;
    use sea_orm_migration::MigratorTrait;
    use time::macros::{date, time};

    pub async fn test_db() -> DatabaseConnection {
        let db = sea_orm::Database::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory sqlite DB.");
        migration::Migrator::up(&db, None)
            .await
            .expect("Applying initial DB migrations failed");
        db
    }

    pub async fn account(db: &DatabaseConnection, name: &str) -> i64 {
        db::accounts::ActiveModel {
            name: Set(name.to_owned()),
            email: Set(Some(format!("{name}@example.com"))),
            created_at: Set(TimeDateTimeWithTimeZone::now_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to insert account")
        .id
    }

    fn january_fridays() -> NewSeason {
        NewSeason {
            name: "Winter".to_owned(),
            start_date: date!(2026 - 01 - 01),
            end_date: date!(2026 - 01 - 31),
            day_of_week: 5,
            game_time: time!(19:00),
            exclude_dates: [date!(2026 - 01 - 16)].into_iter().collect(),
        }
    }

    // A season with three teams, each captained by its own account.
    struct League {
        db: DatabaseConnection,
        season_id: i64,
        game_days: Vec<db::game_days::Model>,
        captains: Vec<i64>,
        teams: Vec<i64>,
    }

    async fn league() -> League {
        let db = test_db().await;
        let season = create_season(&db, january_fridays()).await.unwrap();
        let game_days = generate_game_days(&db, season.id).await.unwrap();
        let mut captains = vec![];
        let mut teams = vec![];
        for name in ["aces", "blockers", "diggers"] {
            let captain = account(&db, name).await;
            let team = crate::roster::create_team(&db, Requester::Account(captain), name)
                .await
                .unwrap();
            captains.push(captain);
            teams.push(team.id);
        }
        set_season_teams(&db, season.id, teams.clone())
            .await
            .unwrap();
        League {
            db,
            season_id: season.id,
            game_days,
            captains,
            teams,
        }
    }

    fn entry(team_id: i64, won: i64, lost: i64) -> ResultEntry {
        ResultEntry {
            team_id,
            sets_won: won,
            sets_lost: lost,
            players: None,
        }
    }

    #[tokio::test]
    async fn generate_game_days_is_idempotent() {
        let db = test_db().await;
        let season = create_season(&db, january_fridays()).await.unwrap();
        assert_eq!(season.status, db::seasons::Status::Draft);
        let generated = generate_game_days(&db, season.id).await.unwrap();
        assert_eq!(
            generated.iter().map(|gd| gd.game_date).collect::<Vec<_>>(),
            vec![
                date!(2026 - 01 - 02),
                date!(2026 - 01 - 09),
                date!(2026 - 01 - 23),
                date!(2026 - 01 - 30)
            ]
        );
        assert!(generate_game_days(&db, season.id).await.unwrap().is_empty());
        let all = db::game_days::Entity::find().all(&db).await.unwrap();
        assert_eq!(all.len(), 4);

        // Deleting one brings back exactly that one.
        db::game_days::Entity::delete_by_id(generated[1].id)
            .exec(&db)
            .await
            .unwrap();
        let regenerated = generate_game_days(&db, season.id).await.unwrap();
        assert_eq!(regenerated.len(), 1);
        assert_eq!(regenerated[0].game_date, date!(2026 - 01 - 09));
    }

    #[tokio::test]
    async fn create_season_rejects_bad_input() {
        let db = test_db().await;
        let mut s = january_fridays();
        s.day_of_week = 7;
        assert!(matches!(
            create_season(&db, s).await,
            Err(Error::InvalidInput(_))
        ));
        let mut s = january_fridays();
        s.end_date = date!(2025 - 12 - 01);
        assert!(matches!(
            create_season(&db, s).await,
            Err(Error::InvalidInput(_))
        ));
        let mut s = january_fridays();
        s.name = "".to_owned();
        assert!(matches!(
            create_season(&db, s).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(list_seasons(&db).await.unwrap().is_empty());
        assert!(matches!(
            generate_game_days(&db, 12345).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn schedule_flags_off_schedule_days() {
        let db = test_db().await;
        let season = create_season(&db, january_fridays()).await.unwrap();
        generate_game_days(&db, season.id).await.unwrap();
        // A Saturday added by hand.
        db::game_days::ActiveModel {
            season_id: Set(season.id),
            game_date: Set(date!(2026 - 01 - 10)),
            created_at: Set(TimeDateTimeWithTimeZone::now_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let schedule = season_schedule(&db, season.id).await.unwrap();
        let flags = schedule
            .game_days
            .iter()
            .map(|gd| (gd.game_date, gd.on_schedule))
            .collect::<Vec<_>>();
        assert_eq!(
            flags,
            vec![
                (date!(2026 - 01 - 02), true),
                (date!(2026 - 01 - 09), true),
                (date!(2026 - 01 - 10), false),
                (date!(2026 - 01 - 23), true),
                (date!(2026 - 01 - 30), true),
            ]
        );
        assert_eq!(
            schedule.game_days[0].kickoff,
            date!(2026 - 01 - 02).with_time(time!(19:00))
        );
    }

    #[tokio::test]
    async fn upcoming_skips_past_and_completed() {
        let db = test_db().await;
        let season = create_season(&db, january_fridays()).await.unwrap();
        generate_game_days(&db, season.id).await.unwrap();
        let upcoming = upcoming_game_days(&db, date!(2026 - 01 - 10), 2)
            .await
            .unwrap();
        assert_eq!(
            upcoming.iter().map(|u| u.game_date).collect::<Vec<_>>(),
            vec![date!(2026 - 01 - 23), date!(2026 - 01 - 30)]
        );
        assert_eq!(upcoming[0].season_name, "Winter");
        set_season_status(&db, season.id, db::seasons::Status::Completed)
            .await
            .unwrap();
        assert!(upcoming_game_days(&db, date!(2026 - 01 - 10), 2)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn default_season_prefers_active() {
        let db = test_db().await;
        assert!(default_season(&db).await.unwrap().is_none());
        let first = create_season(&db, january_fridays()).await.unwrap();
        let second = create_season(&db, january_fridays()).await.unwrap();
        assert_eq!(default_season(&db).await.unwrap().map(|s| s.id), Some(second.id));
        set_season_status(&db, first.id, db::seasons::Status::Active)
            .await
            .unwrap();
        assert_eq!(default_season(&db).await.unwrap().map(|s| s.id), Some(first.id));
    }

    #[tokio::test]
    async fn results_upsert_and_tally() {
        let l = league().await;
        let db = &l.db;
        let gd = l.game_days[0].id;
        let captain = Requester::Account(l.captains[0]);
        record_result(db, captain, gd, entry(l.teams[0], 2, 1))
            .await
            .unwrap();
        // Correction of the same game day replaces, not adds.
        let stored = record_result(db, captain, gd, entry(l.teams[0], 3, 1))
            .await
            .unwrap();
        assert_eq!((stored.sets_won, stored.sets_lost), (3, 1));
        assert_eq!(stored.reported_by, Some(l.captains[0]));
        let rows = db::game_results::Entity::find().all(db).await.unwrap();
        assert_eq!(rows.len(), 1);
        record_result(db, captain, l.game_days[1].id, entry(l.teams[0], 1, 2))
            .await
            .unwrap();
        let st = db::season_teams::Entity::find()
            .filter(db::season_teams::Column::TeamId.eq(l.teams[0]))
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((st.total_sets_won, st.total_sets_lost), (4, 3));
        assert!(recalculate_season_tallies(db, l.season_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn results_are_validated() {
        let l = league().await;
        let db = &l.db;
        let gd = l.game_days[0].id;
        let captain = Requester::Account(l.captains[0]);
        assert!(matches!(
            record_result(db, captain, gd, entry(l.teams[1], 3, 0)).await,
            Err(Error::Denied)
        ));
        assert!(matches!(
            record_result(db, Requester::Unauthenticated, gd, entry(l.teams[0], 3, 0)).await,
            Err(Error::Denied)
        ));
        assert!(matches!(
            record_result(db, captain, gd, entry(l.teams[0], -1, 0)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            record_result(db, captain, 9999, entry(l.teams[0], 1, 0)).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            record_result(db, captain, gd, entry(l.teams[0], i64::MAX, 1)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            record_game_day_results(
                db,
                Requester::System,
                gd,
                vec![entry(l.teams[1], 3, 0), entry(l.teams[2], 0, 100)]
            )
            .await,
            Err(Error::InvalidInput(_))
        ));
        let mut with_stranger = entry(l.teams[0], 1, 0);
        with_stranger.players = Some(vec![l.captains[0], l.captains[1]]);
        assert!(matches!(
            record_result(db, captain, gd, with_stranger).await,
            Err(Error::InvalidInput(_))
        ));
        // Out of the season.
        set_season_teams(db, l.season_id, vec![l.teams[1], l.teams[2]])
            .await
            .unwrap();
        assert!(matches!(
            record_result(db, captain, gd, entry(l.teams[0], 1, 0)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(db::game_results::Entity::find()
            .all(db)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn oversized_stored_tallies_do_not_panic() {
        let l = league().await;
        let db = &l.db;
        let big = i64::MAX / 2 + 1;
        for gd in l.game_days[..2].iter() {
            db::game_results::ActiveModel {
                game_day_id: Set(gd.id),
                team_id: Set(l.teams[0]),
                sets_won: Set(big),
                sets_lost: Set(0),
                recorded_at: Set(TimeDateTimeWithTimeZone::now_utc()),
                reported_by: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await
            .unwrap();
        }
        assert!(matches!(
            derived_season_standings(db, l.season_id).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            recalculate_season_tallies(db, l.season_id).await,
            Err(Error::InvalidInput(_))
        ));
        write_tally(db, l.season_id, l.teams[0], SetTally { won: i64::MAX, lost: 1 })
            .await
            .unwrap();
        write_tally(db, l.season_id, l.teams[1], SetTally { won: 3, lost: 0 })
            .await
            .unwrap();
        let standings = season_standings(db, l.season_id).await.unwrap().standings;
        assert_eq!(standings[0].team_id, l.teams[1]);
        assert_eq!(standings[1].team_id, l.teams[0]);
        assert_eq!(standings[1].sets_won, i64::MAX);
    }

    #[tokio::test]
    async fn tally_of_team_outside_season_is_an_error() {
        let l = league().await;
        assert!(matches!(
            write_tally(&l.db, l.season_id, 4242, SetTally { won: 1, lost: 0 }).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn standings_rank_by_win_pct() {
        let l = league().await;
        let db = &l.db;
        let admin = account(db, "admin").await;
        db::acls::grant_admin(db, admin).await.unwrap();
        let admin = Requester::Account(admin);
        record_game_day_results(
            db,
            admin,
            l.game_days[0].id,
            vec![
                entry(l.teams[0], 10, 5),
                entry(l.teams[1], 8, 2),
                entry(l.teams[2], 3, 3),
            ],
        )
        .await
        .unwrap();
        let standings = season_standings(db, l.season_id).await.unwrap();
        let order = standings
            .standings
            .iter()
            .map(|s| (s.rank, s.team_id))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![(1, l.teams[1]), (2, l.teams[0]), (3, l.teams[2])]
        );
        assert_eq!(standings.standings[0].win_pct, 80.0);
        let derived = derived_season_standings(db, l.season_id).await.unwrap();
        assert_eq!(derived.standings, standings.standings);

        // A captain may not use the bulk entry.
        assert!(matches!(
            record_game_day_results(
                db,
                Requester::Account(l.captains[0]),
                l.game_days[1].id,
                vec![entry(l.teams[0], 1, 0)]
            )
            .await,
            Err(Error::Denied)
        ));
        assert!(matches!(
            record_game_day_results(
                db,
                admin,
                l.game_days[1].id,
                vec![entry(l.teams[0], 1, 0), entry(l.teams[0], 2, 0)]
            )
            .await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn recalculation_repairs_drift() {
        let l = league().await;
        let db = &l.db;
        record_result(
            db,
            Requester::Account(l.captains[2]),
            l.game_days[0].id,
            entry(l.teams[2], 2, 2),
        )
        .await
        .unwrap();
        db::season_teams::Entity::update_many()
            .col_expr(db::season_teams::Column::TotalSetsWon, Expr::value(7))
            .filter(db::season_teams::Column::TeamId.eq(l.teams[2]))
            .exec(db)
            .await
            .unwrap();
        let corrections = recalculate_season_tallies(db, l.season_id).await.unwrap();
        assert_eq!(
            corrections,
            vec![TallyCorrection {
                team_id: l.teams[2],
                stored: SetTally { won: 7, lost: 2 },
                derived: SetTally { won: 2, lost: 2 },
            }]
        );
        let standings = season_standings(db, l.season_id).await.unwrap();
        let row = standings
            .standings
            .iter()
            .find(|s| s.team_id == l.teams[2])
            .unwrap();
        assert_eq!((row.sets_won, row.sets_lost), (2, 2));
    }

    #[tokio::test]
    async fn set_season_teams_keeps_tallies() {
        let l = league().await;
        let db = &l.db;
        record_result(
            db,
            Requester::Account(l.captains[0]),
            l.game_days[0].id,
            entry(l.teams[0], 3, 0),
        )
        .await
        .unwrap();
        let rows = set_season_teams(db, l.season_id, vec![l.teams[0], l.teams[2]])
            .await
            .unwrap();
        let tallies = rows
            .iter()
            .map(|st| (st.team_id, st.total_sets_won, st.total_sets_lost))
            .collect::<Vec<_>>();
        assert_eq!(tallies, vec![(l.teams[0], 3, 0), (l.teams[2], 0, 0)]);
        assert!(matches!(
            set_season_teams(db, l.season_id, vec![l.teams[0], 4242]).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(season_team_rows(db, l.season_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn leaderboard_counts_participants_only() {
        let l = league().await;
        let db = &l.db;
        let bench = account(db, "bench").await;
        crate::roster::add_player(
            db,
            Requester::Account(l.captains[0]),
            l.teams[0],
            "bench@example.com",
            10,
        )
        .await
        .unwrap();
        let mut first = entry(l.teams[0], 3, 1);
        first.players = Some(vec![l.captains[0], bench]);
        record_result(db, Requester::Account(l.captains[0]), l.game_days[0].id, first)
            .await
            .unwrap();
        let mut second = entry(l.teams[0], 0, 3);
        second.players = Some(vec![l.captains[0]]);
        record_result(db, Requester::Account(l.captains[0]), l.game_days[1].id, second)
            .await
            .unwrap();
        let mut other = entry(l.teams[1], 5, 0);
        other.players = Some(vec![l.captains[1]]);
        record_result(db, Requester::Account(l.captains[1]), l.game_days[0].id, other)
            .await
            .unwrap();
        // No players listed, so nobody gets credit.
        record_result(
            db,
            Requester::Account(l.captains[2]),
            l.game_days[0].id,
            entry(l.teams[2], 9, 0),
        )
        .await
        .unwrap();

        let board = leaderboard(db, 20).await.unwrap();
        let rows = board
            .entries
            .iter()
            .map(|r| {
                (
                    r.name.as_str(),
                    r.entry.sets_won,
                    r.entry.sets_lost,
                    r.entry.games_played,
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                ("blockers", 5, 0, 1),
                ("bench", 3, 1, 1),
                ("aces", 3, 4, 2),
            ]
        );
        assert_eq!(board.entries[0].entry.teams_played_on, vec!["blockers"]);
        assert_eq!(
            board.most_sets_won.as_ref().map(|r| r.entry.account_id),
            Some(l.captains[1])
        );
        let top = leaderboard(db, 1).await.unwrap();
        assert_eq!(top.entries.len(), 1);
    }

    #[tokio::test]
    async fn delete_season_cascades() {
        let l = league().await;
        let db = &l.db;
        let mut e = entry(l.teams[0], 3, 1);
        e.players = Some(vec![l.captains[0]]);
        record_result(db, Requester::Account(l.captains[0]), l.game_days[0].id, e)
            .await
            .unwrap();
        let acls_before = db::acls::Entity::find().all(db).await.unwrap();
        delete_season(db, l.season_id).await.unwrap();
        assert!(db::seasons::Entity::find().all(db).await.unwrap().is_empty());
        assert!(db::game_days::Entity::find().all(db).await.unwrap().is_empty());
        assert!(db::game_results::Entity::find().all(db).await.unwrap().is_empty());
        assert!(db::game_day_players::Entity::find()
            .all(db)
            .await
            .unwrap()
            .is_empty());
        assert!(db::season_teams::Entity::find().all(db).await.unwrap().is_empty());
        assert!(db::season_excluded_dates::Entity::find()
            .all(db)
            .await
            .unwrap()
            .is_empty());
        // Teams outlive the season.
        assert_eq!(db::teams::Entity::find().all(db).await.unwrap().len(), 3);
        // Seasons and game days only carry wildcard grants; captains keep
        // their team grants.
        assert_eq!(db::acls::Entity::find().all(db).await.unwrap(), acls_before);
        assert!(matches!(
            delete_season(db, l.season_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn edit_game_day_clears_blank_fields() {
        let l = league().await;
        let db = &l.db;
        let gd = l.game_days[0].id;
        let edited = edit_game_day(
            db,
            gd,
            GameDayUpdate {
                description: Some("Finals".to_owned()),
                image_url: Some("https://img.example.com/finals.jpg".to_owned()),
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.description.as_deref(), Some("Finals"));
        let edited = edit_game_day(
            db,
            gd,
            GameDayUpdate {
                description: Some("  ".to_owned()),
                image_url: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.description, None);
        assert_eq!(edited.image_url, None);
        assert!(matches!(
            edit_game_day(
                db,
                gd,
                GameDayUpdate {
                    description: None,
                    image_url: Some("javascript:alert(1)".to_owned()),
                }
            )
            .await,
            Err(Error::InvalidInput(_))
        ));
    }
}
