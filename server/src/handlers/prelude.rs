pub use actix_session::Session;
pub use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
pub use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
pub use serde::{Deserialize, Serialize};

pub use volleyleague_db as db;

pub use crate::acl::{self, acl_check_to_http_error, Requester};
pub use crate::engine;
pub use crate::http_types::*;
pub use crate::kratos::requester;
pub use crate::roster;
pub use crate::server_state::*;

#[derive(Deserialize, Debug)]
pub struct SeasonFilter {
    pub season_id: Option<i64>,
}

/// The requester, provided it is a signed-in account.
pub async fn account_requester(
    req: &HttpRequest,
    session: &Session,
) -> Result<Requester, AppHttpError> {
    match requester(req, session).await? {
        Requester::Unauthenticated => Err(AppHttpError::Unauthenticated),
        r => Ok(r),
    }
}

/// Wildcard write on the kind, which only admins hold.
pub async fn check_admin(
    state: &ServerState,
    requester: Requester,
    entity_kind: db::common::EntityKind,
) -> Result<(), AppHttpError> {
    acl::check(
        &state.db,
        requester,
        db::acls::AccessType::Write,
        entity_kind,
        None,
    )
    .await
    .map_err(acl_check_to_http_error)
}

/// The requested season, or the default one.
pub async fn season_or_default(
    state: &ServerState,
    season_id: Option<i64>,
) -> Result<i64, AppHttpError> {
    if let Some(id) = season_id {
        return Ok(id);
    }
    engine::default_season(&state.db)
        .await?
        .map(|s| s.id)
        .ok_or(AppHttpError::NotFound)
}
