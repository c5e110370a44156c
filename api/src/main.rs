use std::sync::Arc;

use almanac_api::{config::AlmanacApiConfig, server};
use almanac_db::storage::PostgresStorage;
use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AlmanacApiConfig::parse();

    let db = Arc::new(PostgresStorage::new(
        &config.database_url,
        config.database_max_connections,
    ));
    let (router, api) = server::make(config.clone(), db)?;

    if config.dump_openapi {
        let json = api.to_pretty_json()?;
        print!("{}", json);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or("almanac_api=info,almanac_common=info,almanac_db=info".into()),
        )
        .pretty()
        .init();

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, router)
        .await
        .context("Server exited with an error")
}
