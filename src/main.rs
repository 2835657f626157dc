use std::{path::Path, sync::Arc};

use anyhow::Context;
use migration::MigratorTrait;
use progress_store::{
    ProgressStoreResult,
    config::Config,
    run_poem,
    storage::{SeaOrmProgressRepo, database},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

#[tokio::main]
async fn main() -> ProgressStoreResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for the database stack.
    let default_filter = format!(
        "{}=info,poem=info,sea_orm=warn,sqlx=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting Progress Store"
    );
    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load()?;
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!(e));
    }

    let db_conn = database::connect(&config).await?;

    migration::Migrator::up(&db_conn, None)
        .await
        .with_context(|| "Failed to run database migrations")?;
    tracing::info!(
        timeout_secs = config.db_timeout_secs,
        max_connections = config.db_max_connections,
        "database ready"
    );

    let repo = Arc::new(SeaOrmProgressRepo::new(db_conn));
    run_poem(repo, Arc::new(config)).await?;
    Ok(())
}
