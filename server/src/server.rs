use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::{App, HttpServer};
use sea_orm::Database;

use crate::config::*;
use crate::handlers::*;
use crate::server_state::*;

pub struct Handle {
    pub server: actix_web::dev::Server,
    pub addrs: Vec<std::net::SocketAddr>,
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let handle = create(config).await?;
    log::info!("Serving on {:?}", handle.addrs);
    handle.server.await?;
    Ok(())
}

pub async fn create(config: Config) -> anyhow::Result<Handle> {
    let mut db_options = sea_orm::ConnectOptions::new(&config.db_path);
    db_options.max_connections(32);
    let db = Database::connect(db_options).await?;
    let port = config.server_config.port;
    let app_state = ServerState {
        config: config.server_config,
        league: config.league_config,
        db,
    };

    let secret_key = actix_web::cookie::Key::generate();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .app_data(app_state.clone())
            .service(get_index::get_index)
            .service(auth::get_logout)
            .service(auth::post_kratos_after_registration_hook)
            .service(auth::post_kratos_after_settings_hook)
            .service(seasons::get_seasons)
            .service(seasons::post_create_season)
            .service(seasons::post_season_status)
            .service(seasons::post_season_teams)
            .service(seasons::post_generate_game_days)
            .service(seasons::post_delete_season)
            .service(get_schedule::get_schedule)
            .service(get_standings::get_standings)
            .service(game_days::post_edit_game_day)
            .service(game_days::post_game_day_results)
            .service(post_report_result::post_report_result)
            .service(teams::get_teams)
            .service(teams::get_team)
            .service(teams::post_create_team)
            .service(teams::post_add_player)
            .service(teams::post_remove_member)
            .service(teams::post_cancel_invite)
            .service(newsletters::get_newsletters)
            .service(newsletters::post_create_newsletter)
            .service(newsletters::post_edit_newsletter)
            .service(newsletters::post_publish_newsletter)
            .service(newsletters::post_delete_newsletter)
            .service(admins::get_admins)
            .service(admins::post_grant_admin)
            .service(admins::post_revoke_admin)
    })
    .workers(8)
    .bind(("::", port))?;
    let addrs = server.addrs();
    let server = server.run(); // Does not actually run the server but creates a future.
    Ok(Handle { server, addrs })
}
