use sea_orm::prelude::TimeDateTimeWithTimeZone;

use crate::handlers::prelude::*;
use crate::validation;

use db::common::EntityKind;

#[derive(Serialize)]
struct AdminData {
    account_id: i64,
    name: String,
    email: Option<String>,
    granted_at: TimeDateTimeWithTimeZone,
}

#[get("/admins")]
pub async fn get_admins(req: HttpRequest, session: Session) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Account).await?;
    let admins = acl::list_admins(&state.db).await.map_err(|e| {
        log::error!("Failed to list admins: {e:?}");
        AppHttpError::Internal
    })?;
    Ok(HttpResponse::Ok().json(
        admins
            .into_iter()
            .map(|(account, granted_at)| AdminData {
                account_id: account.id,
                name: account.shown_name().to_owned(),
                email: account.email,
                granted_at,
            })
            .collect::<Vec<_>>(),
    ))
}

#[derive(Deserialize)]
struct GrantInfo {
    email: String,
}

#[post("/admins")]
pub async fn post_grant_admin(
    req: HttpRequest,
    session: Session,
    info: web::Json<GrantInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Account).await?;
    let email = validation::normalize_email(&info.email).map_err(AppHttpError::InvalidInput)?;
    let account = db::accounts::Entity::find()
        .filter(db::accounts::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch account by e-mail: {e:?}");
            AppHttpError::Internal
        })?
        .ok_or(AppHttpError::NotFound)?;
    db::acls::grant_admin(&state.db, account.id)
        .await
        .map_err(|e| {
            log::error!("Failed to grant admin to {}: {e:?}", account.id);
            AppHttpError::Internal
        })?;
    log::info!("Account {} made admin by {requester:?}", account.id);
    Ok(HttpResponse::NoContent().finish())
}

#[post("/admins/{account_id}/remove")]
pub async fn post_revoke_admin(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Account).await?;
    let account_id = *path;
    // Keep at least one admin around.
    if requester.account_id() == Some(account_id) {
        return Err(AppHttpError::Conflict(
            "Admins cannot revoke their own access".to_owned(),
        ));
    }
    let removed = db::acls::revoke_admin(&state.db, account_id)
        .await
        .map_err(|e| {
            log::error!("Failed to revoke admin from {account_id}: {e:?}");
            AppHttpError::Internal
        })?;
    if removed == 0 {
        return Err(AppHttpError::NotFound);
    }
    log::info!("Account {account_id} is no longer admin, by {requester:?}");
    Ok(HttpResponse::NoContent().finish())
}
