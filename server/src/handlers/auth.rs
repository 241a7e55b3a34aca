use crate::handlers::prelude::*;
use crate::kratos::{kratos_after_registration_hook, kratos_logout, AccountInfo};

#[derive(Deserialize)]
struct LogoutInfo {
    finished: Option<bool>,
}

// Kratos sends the browser back here with `finished=true` once its own
// session is gone.
#[get("/logout")]
pub async fn get_logout(
    req: HttpRequest,
    session: Session,
    info: web::Query<LogoutInfo>,
) -> Result<HttpResponse<()>, AppHttpError> {
    if let Ok(Some(account_id)) = session.get::<i64>("account_id") {
        log::trace!("Logging out account {account_id}");
    }
    session.purge();
    if info.finished != Some(true) {
        return kratos_logout(&req).await;
    }
    let home = format!("{}/", server_state(&req)?.config.site_base_url_path);
    Ok(web::Redirect::to(home).see_other().respond_to(&req))
}

#[post("/kratos_after_registration_hook")]
pub async fn post_kratos_after_registration_hook(
    req: HttpRequest,
    info: web::Json<AccountInfo>,
) -> HttpResult {
    kratos_after_registration_hook(req, info).await
}

// Username or e-mail may have changed; same upsert as on registration.
#[post("/kratos_after_settings_hook")]
pub async fn post_kratos_after_settings_hook(
    req: HttpRequest,
    info: web::Json<AccountInfo>,
) -> HttpResult {
    kratos_after_registration_hook(req, info).await
}
