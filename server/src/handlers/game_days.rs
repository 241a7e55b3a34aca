use crate::handlers::prelude::*;

use db::common::EntityKind;

#[derive(Serialize)]
struct GameDayData {
    id: i64,
    season_id: i64,
    game_date: time::Date,
    description: Option<String>,
    image_url: Option<String>,
}

#[post("/game_days/{game_day_id}")]
pub async fn post_edit_game_day(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<engine::GameDayUpdate>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    check_admin(state, requester, EntityKind::GameDay).await?;
    let gd = engine::edit_game_day(&state.db, *path, info.into_inner()).await?;
    Ok(HttpResponse::Ok().json(GameDayData {
        id: gd.id,
        season_id: gd.season_id,
        game_date: gd.game_date,
        description: gd.description,
        image_url: gd.image_url,
    }))
}

#[derive(Deserialize)]
struct BulkResults {
    results: Vec<engine::ResultEntry>,
}

#[derive(Serialize)]
struct StoredResult {
    team_id: i64,
    sets_won: i64,
    sets_lost: i64,
}

#[post("/game_days/{game_day_id}/results")]
pub async fn post_game_day_results(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<BulkResults>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let stored =
        engine::record_game_day_results(&state.db, requester, *path, info.into_inner().results)
            .await?;
    Ok(HttpResponse::Ok().json(
        stored
            .into_iter()
            .map(|r| StoredResult {
                team_id: r.team_id,
                sets_won: r.sets_won,
                sets_lost: r.sets_lost,
            })
            .collect::<Vec<_>>(),
    ))
}
