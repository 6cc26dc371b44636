use anyhow::Result;

use pagesift_core::config::AppConfig;
use pagesift_index::Indexer;
use pagesift_storage::ContentStore;

pub async fn run(config: AppConfig) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;
    let indexer = Indexer::connect(&config, store.clone()).await;

    let index_stats = indexer.stats().await;
    let store_stats = store.stats().await?;

    println!("System statistics:");
    println!("  Total documents:  {}", index_stats.total_documents);
    println!("  Index size:       {} bytes", index_stats.index_size);
    println!(
        "  Index available:  {}",
        if index_stats.index_available { "yes" } else { "no" }
    );
    println!("  Content today:    {}", store_stats.content_today);

    let top_tags: Vec<&str> =
        store_stats.top_tags.iter().take(5).map(|t| t.tag.as_str()).collect();
    println!("  Top tags:         {}", top_tags.join(", "));

    Ok(())
}
