use crate::handlers::prelude::*;

#[derive(Deserialize)]
struct ReportInfo {
    game_day_id: i64,
    #[serde(flatten)]
    result: engine::ResultEntry,
}

#[derive(Serialize)]
struct Reported {
    game_day_id: i64,
    team_id: i64,
    sets_won: i64,
    sets_lost: i64,
}

// Captains report their own team; admins pass the team check through the
// wildcard grant.
#[post("/report_result")]
pub async fn post_report_result(
    req: HttpRequest,
    session: Session,
    info: web::Json<ReportInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let ReportInfo {
        game_day_id,
        result,
    } = info.into_inner();
    let stored = engine::record_result(&state.db, requester, game_day_id, result).await?;
    Ok(HttpResponse::Ok().json(Reported {
        game_day_id: stored.game_day_id,
        team_id: stored.team_id,
        sets_won: stored.sets_won,
        sets_lost: stored.sets_lost,
    }))
}
