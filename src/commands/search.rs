use anyhow::Result;

use pagesift_core::config::AppConfig;
use pagesift_search::{SearchEngine, SearchFilters};
use pagesift_storage::ContentStore;

pub async fn run(config: AppConfig, query: String, limit: usize) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;
    let engine = SearchEngine::connect(&config, store).await;

    let results = engine.search(&query, &SearchFilters::default(), limit, 0).await?;

    println!("Found {} results:\n", results.total);
    for hit in results.hits {
        println!("- {}", hit.title);
        println!("  {}", hit.url);
        if !hit.description.is_empty() {
            println!("  {}", hit.description);
        }
        for (field, fragments) in &hit.highlights {
            if let Some(first) = fragments.first() {
                println!("  {}: ...{}...", field, first);
            }
        }
        println!();
    }

    Ok(())
}
