use clap::Parser;

use volleyleague_server::engine;

#[derive(Parser, Debug)]
struct Config {
    #[arg(long)]
    db: String,
    #[arg(long)]
    season_id: i64,
    /// Print the dates the season's rule produces without inserting anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    let db = sea_orm::Database::connect(&cfg.db).await?;
    if cfg.dry_run {
        let (season, rule) = engine::load_season(&db, cfg.season_id).await?;
        for date in rule.game_dates(season.start_date, season.end_date)? {
            println!("{}", rule.kickoff(date));
        }
        return Ok(());
    }
    let inserted = engine::generate_game_days(&db, cfg.season_id).await?;
    for gd in inserted.iter() {
        println!("Inserted game day {} on {}", gd.id, gd.game_date);
    }
    println!("{} new game days", inserted.len());
    Ok(())
}
