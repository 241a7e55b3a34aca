use sea_orm::prelude::TimeDateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, Set};

use crate::handlers::prelude::*;
use crate::validation;

use db::common::EntityKind;

#[derive(Serialize)]
struct NewsletterData {
    id: i64,
    title: String,
    content: String,
    author: String,
    created_at: TimeDateTimeWithTimeZone,
    published_at: Option<TimeDateTimeWithTimeZone>,
}

async fn newsletter_data(
    state: &ServerState,
    newsletters: Vec<db::newsletters::Model>,
) -> Result<Vec<NewsletterData>, AppHttpError> {
    let authors =
        engine::account_names(&state.db, newsletters.iter().map(|n| n.created_by)).await?;
    Ok(newsletters
        .into_iter()
        .map(|n| NewsletterData {
            author: authors.get(&n.created_by).cloned().unwrap_or_default(),
            id: n.id,
            title: n.title,
            content: n.content,
            created_at: n.created_at,
            published_at: n.published_at,
        })
        .collect())
}

async fn find_newsletter(
    state: &ServerState,
    newsletter_id: i64,
) -> Result<db::newsletters::Model, AppHttpError> {
    db::newsletters::Entity::find_by_id(newsletter_id)
        .one(&state.db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch newsletter {newsletter_id}: {e:?}");
            AppHttpError::Internal
        })?
        .ok_or(AppHttpError::NotFound)
}

// Admins see drafts as well.
#[get("/newsletters")]
pub async fn get_newsletters(req: HttpRequest, session: Session) -> HttpResult {
    let state = server_state(&req)?;
    let requester = requester(&req, &session).await?;
    let is_admin = acl::is_admin(&state.db, requester).await.map_err(|e| {
        log::error!("Failed to check admin status of {requester:?}: {e:?}");
        AppHttpError::Internal
    })?;
    let mut query = db::newsletters::Entity::find();
    if !is_admin {
        query = query.filter(db::newsletters::Column::PublishedAt.is_not_null());
    }
    let newsletters = query
        .order_by_desc(db::newsletters::Column::PublishedAt)
        .order_by_desc(db::newsletters::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch newsletters: {e:?}");
            AppHttpError::Internal
        })?;
    Ok(HttpResponse::Ok().json(newsletter_data(state, newsletters).await?))
}

#[derive(Deserialize)]
struct NewsletterInfo {
    title: String,
    content: String,
}

#[post("/newsletters")]
pub async fn post_create_newsletter(
    req: HttpRequest,
    session: Session,
    info: web::Json<NewsletterInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Newsletter).await?;
    let NewsletterInfo { title, content } = info.into_inner();
    validation::validate_newsletter(&title, &content).map_err(AppHttpError::InvalidInput)?;
    let created_by = requester.account_id().ok_or(AppHttpError::Unauthenticated)?;
    let newsletter = db::newsletters::ActiveModel {
        title: Set(title),
        content: Set(content),
        created_by: Set(created_by),
        created_at: Set(TimeDateTimeWithTimeZone::now_utc()),
        published_at: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        log::error!("Failed to insert newsletter by {requester:?}: {e:?}");
        AppHttpError::Internal
    })?;
    log::info!("Newsletter {} drafted by {requester:?}", newsletter.id);
    let mut data = newsletter_data(state, vec![newsletter]).await?;
    Ok(HttpResponse::Created().json(data.pop()))
}

#[post("/newsletters/{newsletter_id}")]
pub async fn post_edit_newsletter(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<NewsletterInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Newsletter).await?;
    let NewsletterInfo { title, content } = info.into_inner();
    validation::validate_newsletter(&title, &content).map_err(AppHttpError::InvalidInput)?;
    let mut newsletter: db::newsletters::ActiveModel =
        find_newsletter(state, *path).await?.into();
    newsletter.title = Set(title);
    newsletter.content = Set(content);
    let newsletter = newsletter.update(&state.db).await.map_err(|e| {
        log::error!("Failed to update newsletter {}: {e:?}", *path);
        AppHttpError::Internal
    })?;
    let mut data = newsletter_data(state, vec![newsletter]).await?;
    Ok(HttpResponse::Ok().json(data.pop()))
}

/// Publishes a draft, or takes a published newsletter back to draft.
#[post("/newsletters/{newsletter_id}/publish")]
pub async fn post_publish_newsletter(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Newsletter).await?;
    let current = find_newsletter(state, *path).await?;
    let published_at = match current.published_at {
        Some(_) => None,
        None => Some(TimeDateTimeWithTimeZone::now_utc()),
    };
    let mut newsletter: db::newsletters::ActiveModel = current.into();
    newsletter.published_at = Set(published_at);
    let newsletter = newsletter.update(&state.db).await.map_err(|e| {
        log::error!("Failed to publish newsletter {}: {e:?}", *path);
        AppHttpError::Internal
    })?;
    log::info!(
        "Newsletter {} {} by {requester:?}",
        newsletter.id,
        if published_at.is_some() { "published" } else { "unpublished" }
    );
    let mut data = newsletter_data(state, vec![newsletter]).await?;
    Ok(HttpResponse::Ok().json(data.pop()))
}

#[post("/newsletters/{newsletter_id}/delete")]
pub async fn post_delete_newsletter(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Newsletter).await?;
    let res = db::newsletters::Entity::delete_by_id(*path)
        .exec(&state.db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete newsletter {}: {e:?}", *path);
            AppHttpError::Internal
        })?;
    if res.rows_affected == 0 {
        return Err(AppHttpError::NotFound);
    }
    log::info!("Newsletter {} deleted by {requester:?}", *path);
    Ok(HttpResponse::NoContent().finish())
}
