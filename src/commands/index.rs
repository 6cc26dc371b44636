use anyhow::Result;

use pagesift_core::config::AppConfig;
use pagesift_index::Indexer;
use pagesift_storage::ContentStore;

pub async fn run(config: AppConfig) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;
    let indexer = Indexer::connect(&config, store).await;

    let health = indexer.health().await;
    println!("Indexer health check:");
    println!("  Index:   {}", if health.index { "ok" } else { "unavailable" });
    println!("  Store:   {}", if health.store { "ok" } else { "unavailable" });
    println!("  Overall: {}", if health.overall { "ok" } else { "degraded" });

    Ok(())
}
