use clap::Parser;

use volleyleague_server::engine;

#[derive(Parser, Debug)]
struct Config {
    #[arg(long)]
    db: String,
    #[arg(long)]
    season_id: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    let db = sea_orm::Database::connect(&cfg.db).await?;
    let corrections = engine::recalculate_season_tallies(&db, cfg.season_id).await?;
    for c in corrections.iter() {
        println!(
            "Team {}: {}-{} -> {}-{}",
            c.team_id, c.stored.won, c.stored.lost, c.derived.won, c.derived.lost
        );
    }
    let standings = engine::season_standings(&db, cfg.season_id).await?;
    println!("{}", serde_json::to_string_pretty(&standings)?);
    Ok(())
}
