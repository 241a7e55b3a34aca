use crate::handlers::prelude::*;

#[get("/teams")]
pub async fn get_teams(req: HttpRequest, session: Session) -> HttpResult {
    let state = server_state(&req)?;
    account_requester(&req, &session).await?;
    Ok(HttpResponse::Ok().json(roster::list_teams(&state.db).await?))
}

#[get("/teams/{team_id}")]
pub async fn get_team(req: HttpRequest, session: Session, path: web::Path<i64>) -> HttpResult {
    let state = server_state(&req)?;
    account_requester(&req, &session).await?;
    Ok(HttpResponse::Ok().json(roster::team_roster(&state.db, *path).await?))
}

#[derive(Deserialize)]
struct CreateTeamInfo {
    name: String,
}

#[post("/teams")]
pub async fn post_create_team(
    req: HttpRequest,
    session: Session,
    info: web::Json<CreateTeamInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let team = roster::create_team(&state.db, requester, &info.name).await?;
    Ok(HttpResponse::Created().json(roster::TeamSummary::from(team)))
}

#[derive(Deserialize)]
struct AddPlayerInfo {
    email: String,
}

#[post("/teams/{team_id}/players")]
pub async fn post_add_player(
    req: HttpRequest,
    session: Session,
    path: web::Path<i64>,
    info: web::Json<AddPlayerInfo>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let added = roster::add_player(
        &state.db,
        requester,
        *path,
        &info.email,
        state.league.max_roster_size,
    )
    .await?;
    Ok(HttpResponse::Ok().json(added))
}

#[post("/teams/{team_id}/members/{member_id}/remove")]
pub async fn post_remove_member(
    req: HttpRequest,
    session: Session,
    path: web::Path<(i64, i64)>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let (team_id, member_id) = path.into_inner();
    roster::remove_member(&state.db, requester, team_id, member_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/teams/{team_id}/invites/{invite_id}/cancel")]
pub async fn post_cancel_invite(
    req: HttpRequest,
    session: Session,
    path: web::Path<(i64, i64)>,
) -> HttpResult {
    let state = server_state(&req)?;
    let requester = account_requester(&req, &session).await?;
    let (team_id, invite_id) = path.into_inner();
    roster::cancel_invite(&state.db, requester, team_id, invite_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
