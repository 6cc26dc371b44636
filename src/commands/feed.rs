use std::path::PathBuf;

use anyhow::Result;

use pagesift_core::config::AppConfig;
use pagesift_feed::{FeedFormat, FeedGenerator};
use pagesift_storage::ContentStore;

pub async fn run(
    config: AppConfig,
    topic: Option<String>,
    format: FeedFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;
    let generator = FeedGenerator::new(store, &config.feed);

    let content = generator.generate(topic.as_deref(), format).await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &content)?;
            println!("Feed saved to {}", path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}
