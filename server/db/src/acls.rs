use crate::common;
use sea_orm::entity::prelude::*;
use sea_orm::strum::IntoEnumIterator;
use sea_orm::{Condition, Set};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum GranteeKind {
    #[sea_orm(string_value = "everyone")]
    Everyone,
    #[sea_orm(string_value = "account")]
    Account,
    #[sea_orm(string_value = "any-registered-user")]
    AnyRegisteredUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum AccessType {
    #[sea_orm(string_value = "read")]
    Read,
    #[sea_orm(string_value = "write")]
    Write,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "acls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    // Must not be None.
    pub entity_kind: common::EntityKind,

    // If None gives access to every entity of the kind.
    pub entity_id: Option<i64>,

    pub grantee_kind: GranteeKind,
    pub grantee_id: Option<i64>,
    pub access_type: AccessType,
    pub granted_at: TimeDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn league_kinds() -> impl Iterator<Item = common::EntityKind> {
    common::EntityKind::iter().filter(|&ek| ek != common::EntityKind::None)
}

// Registered users can see everything in the league; writes are granted
// per entity or to admins.
pub async fn populate_default_acl<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let now = TimeDateTimeWithTimeZone::now_utc();
    let acl = league_kinds().map(|ek| ActiveModel {
        entity_kind: Set(ek),
        entity_id: Set(None),
        grantee_kind: Set(GranteeKind::AnyRegisteredUser),
        grantee_id: Set(None),
        access_type: Set(AccessType::Read),
        granted_at: Set(now),
        ..Default::default()
    });
    Entity::insert_many(acl).exec(db).await?;
    Ok(())
}

fn admin_condition(account_id: i64) -> Condition {
    Condition::all()
        .add(Column::EntityId.is_null())
        .add(Column::GranteeKind.eq(GranteeKind::Account))
        .add(Column::GranteeId.eq(Some(account_id)))
}

/// Read and write on every entity of every kind.
pub async fn grant_admin<C: ConnectionTrait>(db: &C, account_id: i64) -> Result<(), DbErr> {
    revoke_admin(db, account_id).await?;
    let now = TimeDateTimeWithTimeZone::now_utc();
    let acl = league_kinds().flat_map(|ek| {
        let base = ActiveModel {
            entity_kind: Set(ek),
            entity_id: Set(None),
            grantee_kind: Set(GranteeKind::Account),
            grantee_id: Set(Some(account_id)),
            granted_at: Set(now),
            ..Default::default()
        };
        [
            ActiveModel {
                access_type: Set(AccessType::Read),
                ..base.clone()
            },
            ActiveModel {
                access_type: Set(AccessType::Write),
                ..base
            },
        ]
    });
    Entity::insert_many(acl).exec(db).await?;
    Ok(())
}

pub async fn revoke_admin<C: ConnectionTrait>(db: &C, account_id: i64) -> Result<u64, DbErr> {
    let res = Entity::delete_many()
        .filter(admin_condition(account_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Accounts holding wildcard write on seasons, with the time of the grant.
pub async fn admins<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<(i64, TimeDateTimeWithTimeZone)>, DbErr> {
    Ok(Entity::find()
        .filter(
            Condition::all()
                .add(Column::EntityKind.eq(common::EntityKind::Season))
                .add(Column::EntityId.is_null())
                .add(Column::GranteeKind.eq(GranteeKind::Account))
                .add(Column::AccessType.eq(AccessType::Write)),
        )
        .all(db)
        .await?
        .into_iter()
        .filter_map(|acl| acl.grantee_id.map(|id| (id, acl.granted_at)))
        .collect())
}

/// Read and write on a single entity for its owner.
pub async fn add_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: i64,
    entity_kind: common::EntityKind,
    entity_id: i64,
) -> Result<(), DbErr> {
    let now = TimeDateTimeWithTimeZone::now_utc();
    let base = ActiveModel {
        grantee_kind: Set(GranteeKind::Account),
        grantee_id: Set(Some(owner_id)),
        entity_kind: Set(entity_kind),
        entity_id: Set(Some(entity_id)),
        granted_at: Set(now),
        ..Default::default()
    };
    let acl = [AccessType::Read, AccessType::Write]
        .into_iter()
        .map(|access_type| ActiveModel {
            access_type: Set(access_type),
            ..base.clone()
        });
    Entity::insert_many(acl).exec(db).await?;
    Ok(())
}
