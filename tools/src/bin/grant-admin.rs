use anyhow::anyhow;
use clap::Parser;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use volleyleague_db as db;

#[derive(Parser, Debug)]
struct Config {
    #[arg(long)]
    db: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    revoke: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    let db = sea_orm::Database::connect(&cfg.db).await?;
    let email = cfg.email.trim().to_lowercase();
    let account = db::accounts::Entity::find()
        .filter(db::accounts::Column::Email.eq(email.as_str()))
        .one(&db)
        .await?
        .ok_or_else(|| anyhow!("No account registered with {email}"))?;
    if cfg.revoke {
        let removed = db::acls::revoke_admin(&db, account.id).await?;
        println!("Removed {removed} admin grants from {}", account.name);
    } else {
        db::acls::grant_admin(&db, account.id).await?;
        println!("{} is now an admin", account.name);
    }
    Ok(())
}
