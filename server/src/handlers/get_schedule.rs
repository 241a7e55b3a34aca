use crate::handlers::prelude::*;

#[get("/schedule")]
pub async fn get_schedule(req: HttpRequest, info: web::Query<SeasonFilter>) -> HttpResult {
    let state = server_state(&req)?;
    let season_id = season_or_default(state, info.season_id).await?;
    let schedule = engine::season_schedule(&state.db, season_id).await?;
    Ok(HttpResponse::Ok().json(schedule))
}
