use crate::handlers::prelude::*;

#[derive(Serialize)]
struct StandingsPage {
    #[serde(flatten)]
    season: engine::SeasonStandings,
    leaderboard: engine::Leaderboard,
}

#[get("/standings")]
pub async fn get_standings(req: HttpRequest, info: web::Query<SeasonFilter>) -> HttpResult {
    let state = server_state(&req)?;
    let season_id = season_or_default(state, info.season_id).await?;
    let season = engine::season_standings(&state.db, season_id).await?;
    let leaderboard = engine::leaderboard(&state.db, state.league.leaderboard_limit).await?;
    Ok(HttpResponse::Ok().json(StandingsPage {
        season,
        leaderboard,
    }))
}
