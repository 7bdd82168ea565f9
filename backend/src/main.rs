//! Lot report - prints the virtual batch listing for a snapshot file
//!
//! Loads the configured JSON snapshot into an in-memory store and writes the
//! merged clone lot listing to stdout as JSON.

use lot_lineage_service::{
    services::CloneLotService,
    store::{BatchScope, InMemoryBatchStore},
    telemetry, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    config.grouping.validate()?;

    // Initialize tracing
    telemetry::init(&config.logging);

    tracing::info!("Starting lot report");
    tracing::info!("Environment: {}", config.environment);

    let store = InMemoryBatchStore::load_json(&config.store.snapshot_path).await?;
    let service = CloneLotService::new(store, config.grouping.policy());

    let listing = service.list(&BatchScope::All).await?;
    tracing::info!("Computed {} virtual batches", listing.len());

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
