use anyhow::Result;

use pagesift_core::config::AppConfig;
use pagesift_index::Indexer;
use pagesift_storage::ContentStore;

pub async fn run(config: AppConfig) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;
    let indexer = Indexer::connect(&config, store).await;

    println!("Starting full reindex...");
    let count = indexer.reindex_all().await;
    println!("Reindexed {} documents", count);

    Ok(())
}
