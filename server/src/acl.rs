// Who may read or change what. Rows live in the `acls` table; an entity id
// of NULL grants access to every entity of that kind.
use derive_more::Display;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};

use crate::http_types::AppHttpError;
use db::acls::*;
use db::common::EntityKind;
use volleyleague_db as db;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requester {
    Unauthenticated,
    System,
    Account(i64),
}

impl Requester {
    pub fn account_id(&self) -> Option<i64> {
        match self {
            Requester::Account(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Display)]
pub enum Error {
    Denied,
    DbErr(DbErr),
    InvalidArgument(String),
}

impl std::error::Error for Error {}

pub async fn check<C: ConnectionTrait>(
    db: &C,
    requester: Requester,
    access_type: AccessType,
    entity_kind: EntityKind,
    entity_id: Option<i64>,
) -> Result<(), Error> {
    if let Requester::System = requester {
        return Ok(());
    }
    if entity_kind == EntityKind::None {
        return Err(Error::InvalidArgument(
            "Access check on entity kind None".to_owned(),
        ));
    }
    let requester_clause = {
        let rc = Condition::any().add(Column::GranteeKind.eq(GranteeKind::Everyone));
        if let Requester::Account(id) = requester {
            rc.add(Column::GranteeKind.eq(GranteeKind::AnyRegisteredUser))
                .add(
                    Condition::all()
                        .add(Column::GranteeKind.eq(GranteeKind::Account))
                        .add(Column::GranteeId.eq(Some(id))),
                )
        } else {
            rc
        }
    };
    let entity_clause = {
        let ids = Condition::any().add(Column::EntityId.is_null());
        let ids = match entity_id {
            Some(id) => ids.add(Column::EntityId.eq(Some(id))),
            None => ids,
        };
        Condition::all()
            .add(Column::EntityKind.eq(entity_kind))
            .add(Column::AccessType.eq(access_type))
            .add(ids)
    };
    let c = Condition::all().add(requester_clause).add(entity_clause);
    let acl = Entity::find()
        .filter(c)
        .limit(1)
        .all(db)
        .await
        .map_err(Error::DbErr)?;
    if acl.is_empty() {
        Err(Error::Denied)
    } else {
        Ok(())
    }
}

/// Admins hold wildcard write on seasons, among every other kind.
pub async fn is_admin<C: ConnectionTrait>(db: &C, requester: Requester) -> Result<bool, DbErr> {
    match requester {
        Requester::System => Ok(true),
        Requester::Unauthenticated => Ok(false),
        Requester::Account(id) => Ok(Entity::find()
            .filter(
                Condition::all()
                    .add(Column::EntityKind.eq(EntityKind::Season))
                    .add(Column::EntityId.is_null())
                    .add(Column::GranteeKind.eq(GranteeKind::Account))
                    .add(Column::GranteeId.eq(Some(id)))
                    .add(Column::AccessType.eq(AccessType::Write)),
            )
            .limit(1)
            .all(db)
            .await?
            .first()
            .is_some()),
    }
}

pub async fn list_admins<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(db::accounts::Model, sea_orm::prelude::TimeDateTimeWithTimeZone)>, DbErr> {
    let grants = db::acls::admins(db).await?;
    let accounts = db::accounts::Entity::find()
        .filter(db::accounts::Column::Id.is_in(grants.iter().map(|(id, _)| *id)))
        .all(db)
        .await?;
    Ok(grants
        .into_iter()
        .filter_map(|(id, granted_at)| {
            accounts
                .iter()
                .find(|a| a.id == id)
                .map(|a| (a.clone(), granted_at))
        })
        .collect())
}

pub fn acl_check_to_http_error(e: Error) -> AppHttpError {
    match e {
        Error::Denied => AppHttpError::Unauthorized,
        Error::DbErr(e) => {
            log::error!("ACL check failed: {e:?}");
            AppHttpError::Internal
        }
        Error::InvalidArgument(s) => {
            log::error!("ACL check called with invalid arguments: {s}");
            AppHttpError::Internal
        }
    }
}
