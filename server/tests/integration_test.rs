#[cfg(feature = "integration_tests")]
mod tests {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
    use sea_orm_migration::MigratorTrait;

    use volleyleague_db as db;

    fn config(db_path: &str) -> volleyleague_server::config::Config {
        let server_config = volleyleague_server::config::ServerConfig {
            port: 0,
            site_base_url_path: "".to_owned(),
            auth_base_url: "".to_owned(),
            kratos_api_url: "".to_owned(),
            access_control: volleyleague_server::config::AccessControl {
                insecure_default_account: Some("admin".to_owned()),
            },
        };
        volleyleague_server::config::Config {
            server_config,
            league_config: Default::default(),
            db_path: db_path.to_owned(),
        }
    }

    #[tokio::test]
    async fn server_smoke() {
        env_logger::Builder::from_env(env_logger::Env::default())
            .is_test(true)
            .filter_module("sqlx", log::LevelFilter::Error)
            .init();
        let dir = tempdir::TempDir::new("volleyleague-test").expect("Failed to create test dir");
        let db_url = format!(
            "sqlite://{}/db.sqlite?mode=rwc",
            dir.path().to_str().unwrap()
        );
        let db = sea_orm::Database::connect(&db_url)
            .await
            .expect("Failed to connect to the database");
        unsafe {
            std::env::set_var("VOLLEYLEAGUE_POPULATE_DATABASE", "true");
        }
        migration::Migrator::up(&db, None)
            .await
            .expect("Applying initial DB migrations failed");

        let season = db::seasons::Entity::find()
            .one(&db)
            .await
            .expect("Failed to fetch seasons")
            .expect("Demo season is missing");
        let game_day = db::game_days::Entity::find()
            .filter(db::game_days::Column::SeasonId.eq(season.id))
            .order_by_asc(db::game_days::Column::GameDate)
            .one(&db)
            .await
            .expect("Failed to fetch game days")
            .expect("Demo season has no game days");
        let team = db::season_teams::Entity::find()
            .filter(db::season_teams::Column::SeasonId.eq(season.id))
            .one(&db)
            .await
            .expect("Failed to fetch season teams")
            .expect("Demo season has no teams");

        let handle = volleyleague_server::server::create(config(&db_url))
            .await
            .expect("Failed to create the server");
        let server_handle = handle.server.handle();
        let addr = handle
            .addrs
            .first()
            .expect("No bound address found")
            .to_string();
        let server_join = tokio::task::spawn(async move {
            let _ = handle.server.await.inspect_err(|e| {
                log::error!("Running the server failed: {e:?}");
            });
        });
        let url_prefix = format!("http://{addr}/");

        let pages_to_test = [
            "".to_owned(),
            "seasons".to_owned(),
            "schedule".to_owned(),
            format!("schedule?season_id={}", season.id),
            "standings".to_owned(),
            format!("standings?season_id={}", season.id),
            "teams".to_owned(),
            format!("teams/{}", team.team_id),
            "newsletters".to_owned(),
            "admins".to_owned(),
        ];
        for p in pages_to_test {
            reqwest::get(format!("{url_prefix}{p}"))
                .await
                .unwrap_or_else(|e| panic!("failed to query page {p}: {e}"))
                .error_for_status()
                .unwrap_or_else(|e| panic!("server returned an error for page {p}: {e}"));
        }

        let client = reqwest::Client::new();
        let generated: serde_json::Value = client
            .post(format!(
                "{url_prefix}seasons/{}/generate_game_days",
                season.id
            ))
            .send()
            .await
            .expect("Failed to generate game days")
            .error_for_status()
            .expect("Generating game days failed")
            .json()
            .await
            .expect("Bad generate_game_days response");
        assert_eq!(generated["inserted"], serde_json::json!([]));

        client
            .post(format!("{url_prefix}report_result"))
            .json(&serde_json::json!({
                "game_day_id": game_day.id,
                "team_id": team.team_id,
                "sets_won": 3,
                "sets_lost": 1,
            }))
            .send()
            .await
            .expect("Failed to report a result")
            .error_for_status()
            .expect("Reporting a result failed");
        let standings: serde_json::Value = reqwest::get(format!(
            "{url_prefix}standings?season_id={}",
            season.id
        ))
        .await
        .expect("Failed to fetch standings")
        .json()
        .await
        .expect("Bad standings response");
        let leader = &standings["standings"][0];
        assert_eq!(leader["team_id"], serde_json::json!(team.team_id));
        assert_eq!(leader["sets_won"], serde_json::json!(3));

        let rejected = client
            .post(format!("{url_prefix}report_result"))
            .json(&serde_json::json!({
                "game_day_id": game_day.id,
                "team_id": team.team_id,
                "sets_won": -1,
                "sets_lost": 1,
            }))
            .send()
            .await
            .expect("Failed to report a result");
        assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);

        server_handle.stop(true).await;
        let _ = server_join.await;
    }
}
