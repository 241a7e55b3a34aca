// Teams, their members and pending invites.
use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;

use std::collections::HashSet;

use volleyleague_db as db;

use crate::acl::{self, Requester};
use crate::engine::{account_names, db_err, txn_err, Error};
use crate::validation;

#[derive(Clone, Debug, Serialize)]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub captain_id: i64,
}

impl From<db::teams::Model> for TeamSummary {
    fn from(t: db::teams::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            captain_id: t.captain_id,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RosterMember {
    pub member_id: i64,
    pub account_id: i64,
    pub name: String,
    pub is_captain: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RosterInvite {
    pub invite_id: i64,
    pub email: String,
    pub created_at: TimeDateTimeWithTimeZone,
}

#[derive(Clone, Debug, Serialize)]
pub struct TeamRoster {
    pub team: TeamSummary,
    pub members: Vec<RosterMember>,
    pub invites: Vec<RosterInvite>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddedPlayer {
    Member { member_id: i64, account_id: i64 },
    Invited { invite_id: i64, email: String },
}

pub async fn create_team<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    requester: Requester,
    name: &str,
) -> Result<db::teams::Model, Error> {
    let Requester::Account(captain_id) = requester else {
        return Err(Error::Denied);
    };
    let name = name.trim().to_owned();
    validation::validate_team_name(&name).map_err(Error::InvalidInput)?;
    let team = db
        .transaction::<_, db::teams::Model, Error>(|txn| {
            Box::pin(async move {
                let taken = db::teams::Entity::find()
                    .filter(db::teams::Column::Name.eq(&name))
                    .count(txn)
                    .await
                    .map_err(db_err(format!("Failed to look up team {name:?}")))?;
                if taken > 0 {
                    return Err(Error::Conflict(format!(
                        "Team with the name {name:?} already exists. Choose a different name."
                    )));
                }
                let now = TimeDateTimeWithTimeZone::now_utc();
                let team = db::teams::ActiveModel {
                    name: Set(name),
                    captain_id: Set(captain_id),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err("Failed to insert team"))?;
                db::team_members::ActiveModel {
                    team_id: Set(team.id),
                    account_id: Set(captain_id),
                    joined_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err(format!("Failed to add captain to team {}", team.id)))?;
                db::acls::add_owner(txn, captain_id, db::common::EntityKind::Team, team.id)
                    .await
                    .map_err(db_err(format!("Failed to grant team {} to captain", team.id)))?;
                Ok(team)
            })
        })
        .await
        .map_err(txn_err("Failed to create team"))?;
    log::info!(
        "Account {captain_id} created team {} {:?}",
        team.id,
        team.name
    );
    Ok(team)
}

async fn find_team<C: ConnectionTrait>(db: &C, team_id: i64) -> Result<db::teams::Model, Error> {
    db::teams::Entity::find_by_id(team_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch team {team_id}")))?
        .ok_or_else(|| Error::NotFound(format!("Team {team_id} not found")))
}

async fn check_write<C: ConnectionTrait>(
    db: &C,
    requester: Requester,
    team_id: i64,
) -> Result<(), Error> {
    acl::check(
        db,
        requester,
        db::acls::AccessType::Write,
        db::common::EntityKind::Team,
        Some(team_id),
    )
    .await?;
    Ok(())
}

/// Members plus pending invites.
async fn roster_size<C: ConnectionTrait>(db: &C, team_id: i64) -> Result<u64, Error> {
    let members = db::team_members::Entity::find()
        .filter(db::team_members::Column::TeamId.eq(team_id))
        .count(db)
        .await
        .map_err(db_err(format!("Failed to count members of team {team_id}")))?;
    let invites = db::team_invites::Entity::find()
        .filter(db::team_invites::Column::TeamId.eq(team_id))
        .count(db)
        .await
        .map_err(db_err(format!("Failed to count invites of team {team_id}")))?;
    Ok(members + invites)
}

/// Adds the account behind `email` to the team, or invites the e-mail if
/// nobody has registered with it yet.
pub async fn add_player<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    requester: Requester,
    team_id: i64,
    email: &str,
    max_roster_size: u64,
) -> Result<AddedPlayer, Error> {
    check_write(db, requester, team_id).await?;
    let email = validation::normalize_email(email).map_err(Error::InvalidInput)?;
    let team = find_team(db, team_id).await?;
    let invited_by = requester.account_id().unwrap_or(team.captain_id);
    let added = db
        .transaction::<_, AddedPlayer, Error>(|txn| {
            Box::pin(async move {
                if roster_size(txn, team_id).await? >= max_roster_size {
                    return Err(Error::Conflict(format!(
                        "Roster is full: team {team_id} already has {max_roster_size} players or invites."
                    )));
                }
                let account = db::accounts::Entity::find()
                    .filter(db::accounts::Column::Email.eq(&email))
                    .one(txn)
                    .await
                    .map_err(db_err(format!("Failed to look up account by e-mail {email}")))?;
                let now = TimeDateTimeWithTimeZone::now_utc();
                if let Some(account) = account {
                    let already = db::team_members::Entity::find()
                        .filter(
                            Condition::all()
                                .add(db::team_members::Column::TeamId.eq(team_id))
                                .add(db::team_members::Column::AccountId.eq(account.id)),
                        )
                        .count(txn)
                        .await
                        .map_err(db_err("Failed to look up membership"))?;
                    if already > 0 {
                        return Err(Error::Conflict(format!(
                            "{email} is already a member of team {team_id}."
                        )));
                    }
                    let member = db::team_members::ActiveModel {
                        team_id: Set(team_id),
                        account_id: Set(account.id),
                            joined_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(db_err(format!("Failed to add {email} to team {team_id}")))?;
                    return Ok(AddedPlayer::Member {
                        member_id: member.id,
                        account_id: account.id,
                    });
                }
                let already = db::team_invites::Entity::find()
                    .filter(
                        Condition::all()
                            .add(db::team_invites::Column::TeamId.eq(team_id))
                            .add(db::team_invites::Column::Email.eq(&email)),
                    )
                    .count(txn)
                    .await
                    .map_err(db_err("Failed to look up invite"))?;
                if already > 0 {
                    return Err(Error::Conflict(format!(
                        "{email} is already invited to team {team_id}."
                    )));
                }
                let invite = db::team_invites::ActiveModel {
                    team_id: Set(team_id),
                    email: Set(email.clone()),
                    invited_by: Set(invited_by),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(db_err(format!("Failed to invite {email} to team {team_id}")))?;
                Ok(AddedPlayer::Invited {
                    invite_id: invite.id,
                    email,
                })
            })
        })
        .await
        .map_err(txn_err(format!("Failed to add player to team {team_id}")))?;
    log::info!("Team {team_id}: {added:?}");
    Ok(added)
}

pub async fn remove_member<C: ConnectionTrait>(
    db: &C,
    requester: Requester,
    team_id: i64,
    member_id: i64,
) -> Result<(), Error> {
    check_write(db, requester, team_id).await?;
    let team = find_team(db, team_id).await?;
    let member = db::team_members::Entity::find_by_id(member_id)
        .one(db)
        .await
        .map_err(db_err(format!("Failed to fetch member {member_id}")))?
        .filter(|m| m.team_id == team_id)
        .ok_or_else(|| Error::NotFound(format!("Member {member_id} not in team {team_id}")))?;
    if member.account_id == team.captain_id {
        return Err(Error::InvalidInput(
            "The captain cannot be removed from their team".to_owned(),
        ));
    }
    db::team_members::Entity::delete_by_id(member_id)
        .exec(db)
        .await
        .map_err(db_err(format!("Failed to delete member {member_id}")))?;
    log::info!(
        "Removed account {} from team {team_id} by {requester:?}",
        member.account_id
    );
    Ok(())
}

pub async fn cancel_invite<C: ConnectionTrait>(
    db: &C,
    requester: Requester,
    team_id: i64,
    invite_id: i64,
) -> Result<(), Error> {
    check_write(db, requester, team_id).await?;
    let res = db::team_invites::Entity::delete_many()
        .filter(
            Condition::all()
                .add(db::team_invites::Column::Id.eq(invite_id))
                .add(db::team_invites::Column::TeamId.eq(team_id)),
        )
        .exec(db)
        .await
        .map_err(db_err(format!("Failed to delete invite {invite_id}")))?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound(format!(
            "Invite {invite_id} not in team {team_id}"
        )));
    }
    Ok(())
}

pub async fn list_teams<C: ConnectionTrait>(db: &C) -> Result<Vec<TeamSummary>, Error> {
    Ok(db::teams::Entity::find()
        .order_by_asc(db::teams::Column::Name)
        .all(db)
        .await
        .map_err(db_err("Failed to list teams"))?
        .into_iter()
        .map(TeamSummary::from)
        .collect())
}

/// Teams the account is a member of.
pub async fn teams_of_account<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
) -> Result<Vec<TeamSummary>, Error> {
    let team_ids = db::team_members::Entity::find()
        .filter(db::team_members::Column::AccountId.eq(account_id))
        .select_only()
        .column(db::team_members::Column::TeamId)
        .into_values::<i64, db::team_members::Column>()
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch teams of account {account_id}")))?;
    if team_ids.is_empty() {
        return Ok(vec![]);
    }
    Ok(db::teams::Entity::find()
        .filter(db::teams::Column::Id.is_in(team_ids))
        .order_by_asc(db::teams::Column::Name)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch teams of account {account_id}")))?
        .into_iter()
        .map(TeamSummary::from)
        .collect())
}

pub async fn team_roster<C: ConnectionTrait>(db: &C, team_id: i64) -> Result<TeamRoster, Error> {
    let team = find_team(db, team_id).await?;
    let members = db::team_members::Entity::find()
        .filter(db::team_members::Column::TeamId.eq(team_id))
        .order_by_asc(db::team_members::Column::JoinedAt)
        .order_by_asc(db::team_members::Column::Id)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch members of team {team_id}")))?;
    let invites = db::team_invites::Entity::find()
        .filter(db::team_invites::Column::TeamId.eq(team_id))
        .order_by_asc(db::team_invites::Column::CreatedAt)
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch invites of team {team_id}")))?;
    let names = account_names(db, members.iter().map(|m| m.account_id)).await?;
    Ok(TeamRoster {
        members: members
            .into_iter()
            .map(|m| RosterMember {
                member_id: m.id,
                account_id: m.account_id,
                name: names.get(&m.account_id).cloned().unwrap_or_default(),
                is_captain: m.account_id == team.captain_id,
            })
            .collect(),
        invites: invites
            .into_iter()
            .map(|i| RosterInvite {
                invite_id: i.id,
                email: i.email,
                created_at: i.created_at,
            })
            .collect(),
        team: TeamSummary::from(team),
    })
}

pub(crate) async fn member_ids<C: ConnectionTrait>(
    db: &C,
    team_id: i64,
) -> Result<HashSet<i64>, Error> {
    Ok(db::team_members::Entity::find()
        .filter(db::team_members::Column::TeamId.eq(team_id))
        .select_only()
        .column(db::team_members::Column::AccountId)
        .into_values::<i64, db::team_members::Column>()
        .all(db)
        .await
        .map_err(db_err(format!("Failed to fetch members of team {team_id}")))?
        .into_iter()
        .collect())
}

/// Turns the e-mail's pending invites into memberships. Returns the teams
/// joined.
pub async fn claim_invites<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    account_id: i64,
    email: &str,
) -> Result<Vec<i64>, Error> {
    let email = email.to_lowercase();
    let joined = db
        .transaction::<_, Vec<i64>, Error>(|txn| {
            Box::pin(async move {
                let invites = db::team_invites::Entity::find()
                    .filter(db::team_invites::Column::Email.eq(&email))
                    .all(txn)
                    .await
                    .map_err(db_err(format!("Failed to fetch invites of {email}")))?;
                let mut joined = vec![];
                let now = TimeDateTimeWithTimeZone::now_utc();
                for invite in invites {
                    let already = member_ids(txn, invite.team_id)
                        .await?
                        .contains(&account_id);
                    if !already {
                        db::team_members::ActiveModel {
                            team_id: Set(invite.team_id),
                            account_id: Set(account_id),
                                    joined_at: Set(now),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(db_err(format!(
                            "Failed to add account {account_id} to team {}",
                            invite.team_id
                        )))?;
                        joined.push(invite.team_id);
                    }
                    db::team_invites::Entity::delete_by_id(invite.id)
                        .exec(txn)
                        .await
                        .map_err(db_err(format!("Failed to delete invite {}", invite.id)))?;
                }
                Ok(joined)
            })
        })
        .await
        .map_err(txn_err(format!("Failed to claim invites of account {account_id}")))?;
    if !joined.is_empty() {
        log::info!("Account {account_id} joined teams {joined:?} by invite");
    }
    Ok(joined)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::test::{account, test_db};

    #[tokio::test]
    async fn create_team_makes_captain() {
        let db = test_db().await;
        let captain = account(&db, "setter").await;
        let team = create_team(&db, Requester::Account(captain), "  Net Gains ")
            .await
            .unwrap();
        assert_eq!(team.name, "Net Gains");
        let roster = team_roster(&db, team.id).await.unwrap();
        assert_eq!(roster.members.len(), 1);
        assert!(roster.members[0].is_captain);
        assert_eq!(roster.members[0].name, "setter");
        acl::check(
            &db,
            Requester::Account(captain),
            db::acls::AccessType::Write,
            db::common::EntityKind::Team,
            Some(team.id),
        )
        .await
        .expect("Captain owns the team");

        let other = account(&db, "libero").await;
        assert!(matches!(
            create_team(&db, Requester::Account(other), "Net Gains").await,
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            create_team(&db, Requester::Account(other), &"x".repeat(41)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            create_team(&db, Requester::Unauthenticated, "Other").await,
            Err(Error::Denied)
        ));
        let mine = teams_of_account(&db, captain).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(teams_of_account(&db, other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_player_members_and_invites() {
        let db = test_db().await;
        let captain = Requester::Account(account(&db, "setter").await);
        let hitter = account(&db, "hitter").await;
        let team = create_team(&db, captain, "Spikes").await.unwrap();

        let added = add_player(&db, captain, team.id, "Hitter@Example.com", 4)
            .await
            .unwrap();
        assert!(matches!(added, AddedPlayer::Member { account_id, .. } if account_id == hitter));
        assert!(matches!(
            add_player(&db, captain, team.id, "hitter@example.com", 4).await,
            Err(Error::Conflict(_))
        ));

        let invited = add_player(&db, captain, team.id, "newbie@example.com", 4)
            .await
            .unwrap();
        assert!(matches!(invited, AddedPlayer::Invited { .. }));
        assert!(matches!(
            add_player(&db, captain, team.id, "newbie@example.com", 4).await,
            Err(Error::Conflict(_))
        ));
        add_player(&db, captain, team.id, "fourth@example.com", 4)
            .await
            .unwrap();
        // Two members and two invites fill a roster of four.
        let full = add_player(&db, captain, team.id, "fifth@example.com", 4).await;
        assert!(matches!(full, Err(Error::Conflict(ref s)) if s.starts_with("Roster is full")));

        let stranger = Requester::Account(hitter);
        assert!(matches!(
            add_player(&db, stranger, team.id, "sixth@example.com", 10).await,
            Err(Error::Denied)
        ));
    }

    #[tokio::test]
    async fn remove_and_cancel() {
        let db = test_db().await;
        let captain_id = account(&db, "setter").await;
        let captain = Requester::Account(captain_id);
        account(&db, "hitter").await;
        let team = create_team(&db, captain, "Spikes").await.unwrap();
        let AddedPlayer::Member { member_id, .. } =
            add_player(&db, captain, team.id, "hitter@example.com", 10)
                .await
                .unwrap()
        else {
            panic!("Expected a member");
        };
        let AddedPlayer::Invited { invite_id, .. } =
            add_player(&db, captain, team.id, "later@example.com", 10)
                .await
                .unwrap()
        else {
            panic!("Expected an invite");
        };
        let roster = team_roster(&db, team.id).await.unwrap();
        let captain_member = roster
            .members
            .iter()
            .find(|m| m.is_captain)
            .unwrap()
            .member_id;
        assert!(matches!(
            remove_member(&db, captain, team.id, captain_member).await,
            Err(Error::InvalidInput(_))
        ));
        remove_member(&db, captain, team.id, member_id).await.unwrap();
        cancel_invite(&db, captain, team.id, invite_id).await.unwrap();
        assert!(matches!(
            cancel_invite(&db, captain, team.id, invite_id).await,
            Err(Error::NotFound(_))
        ));
        let roster = team_roster(&db, team.id).await.unwrap();
        assert_eq!(roster.members.len(), 1);
        assert!(roster.invites.is_empty());
    }

    #[tokio::test]
    async fn claim_invites_on_registration() {
        let db = test_db().await;
        let captain = Requester::Account(account(&db, "setter").await);
        let a = create_team(&db, captain, "Spikes").await.unwrap();
        let b = create_team(&db, captain, "Blocks").await.unwrap();
        add_player(&db, captain, a.id, "newbie@example.com", 10)
            .await
            .unwrap();
        add_player(&db, captain, b.id, "newbie@example.com", 10)
            .await
            .unwrap();
        let newbie = account(&db, "newbie").await;
        let mut joined = claim_invites(&db, newbie, "NEWBIE@example.com")
            .await
            .unwrap();
        joined.sort();
        assert_eq!(joined, vec![a.id, b.id]);
        assert!(member_ids(&db, a.id).await.unwrap().contains(&newbie));
        assert!(team_roster(&db, a.id).await.unwrap().invites.is_empty());
        assert!(claim_invites(&db, newbie, "newbie@example.com")
            .await
            .unwrap()
            .is_empty());
    }
}
