use crate::handlers::prelude::*;

use db::common::EntityKind;

#[get("/seasons")]
pub async fn get_seasons(req: HttpRequest) -> HttpResult {
    let state = server_state(&req)?;
    let seasons = engine::list_seasons(&state.db)
        .await?
        .iter()
        .map(engine::SeasonSummary::from)
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(seasons))
}

#[post("/seasons")]
pub async fn post_create_season(
    req: HttpRequest,
    session: Session,
    info: web::Json<engine::NewSeason>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Season).await?;
    let season = engine::create_season(&state.db, info.into_inner()).await?;
    Ok(HttpResponse::Created().json(engine::SeasonSummary::from(&season)))
}

#[derive(Deserialize)]
struct StatusInfo {
    status: String,
}

#[post("/seasons/{season_id}/status")]
pub async fn post_season_status(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<StatusInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Season).await?;
    let status = engine::parse_status(&info.status)?;
    let season = engine::set_season_status(&state.db, *path, status).await?;
    Ok(HttpResponse::Ok().json(engine::SeasonSummary::from(&season)))
}

#[derive(Deserialize)]
struct TeamsInfo {
    team_ids: Vec<i64>,
}

#[derive(Serialize)]
struct SeasonTeam {
    team_id: i64,
    total_sets_won: i64,
    total_sets_lost: i64,
}

#[post("/seasons/{season_id}/teams")]
pub async fn post_season_teams(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<TeamsInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Season).await?;
    let rows = engine::set_season_teams(&state.db, *path, info.into_inner().team_ids).await?;
    Ok(HttpResponse::Ok().json(
        rows.into_iter()
            .map(|st| SeasonTeam {
                team_id: st.team_id,
                total_sets_won: st.total_sets_won,
                total_sets_lost: st.total_sets_lost,
            })
            .collect::<Vec<_>>(),
    ))
}

#[derive(Serialize)]
struct GeneratedGameDays {
    inserted: Vec<time::Date>,
}

#[post("/seasons/{season_id}/generate_game_days")]
pub async fn post_generate_game_days(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Season).await?;
    let inserted = engine::generate_game_days(&state.db, *path).await?;
    Ok(HttpResponse::Ok().json(GeneratedGameDays {
        inserted: inserted.into_iter().map(|gd| gd.game_date).collect(),
    }))
}

#[post("/seasons/{season_id}/delete")]
pub async fn post_delete_season(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::Season).await?;
    engine::delete_season(&state.db, *path).await?;
    Ok(HttpResponse::NoContent().finish())
}
