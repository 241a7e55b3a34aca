use crate::handlers::prelude::*;

#[derive(Serialize)]
struct Dashboard<'a> {
    base_url_path: &'a str,
    auth_url: &'a str,
    authenticated: bool,
    account_id: Option<i64>,
    is_admin: bool,
    my_teams: Vec<roster::TeamSummary>,
    upcoming_game_days: Vec<engine::UpcomingGameDay>,
}

#[get("/")]
pub async fn get_index(req: HttpRequest, session: Session) -> HttpResult {
    let state = server_state(&req)?;
    let config = &state.config;
    let requester = requester(&req, &session).await?;
    let account_id = requester.account_id();
    let is_admin = acl::is_admin(&state.db, requester).await.map_err(|e| {
        log::error!("Failed to check admin status of {requester:?}: {e:?}");
        AppHttpError::Internal
    })?;
    let my_teams = match account_id {
        Some(id) => roster::teams_of_account(&state.db, id).await?,
        None => vec![],
    };
    let today = time::OffsetDateTime::now_utc().date();
    let upcoming_game_days =
        engine::upcoming_game_days(&state.db, today, state.league.upcoming_game_days_limit)
            .await?;
    Ok(HttpResponse::Ok().json(Dashboard {
        base_url_path: &config.site_base_url_path,
        auth_url: &config.auth_base_url,
        authenticated: account_id.is_some(),
        account_id,
        is_admin,
        my_teams,
        upcoming_game_days,
    }))
}
