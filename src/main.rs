mod cli;
mod commands;
mod crawl;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

// mimalloc keeps memory flat under sustained crawl concurrency
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use pagesift_core::config::AppConfig;

use crate::cli::{Cli, Commands};
use crate::crawl::run_crawl;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;

    apply_env_overrides(&mut config);

    match cli.command {
        Commands::Crawl { urls, max_pages } => {
            if let Some(n) = max_pages {
                config.crawler.max_pages = n;
            }
            run_crawl(config, urls).await?;
        }
        Commands::Search { query, limit } => {
            commands::search::run(config, query, limit).await?;
        }
        Commands::Feed { topic, format, output } => {
            commands::feed::run(config, topic, format.into(), output).await?;
        }
        Commands::Index => {
            commands::index::run(config).await?;
        }
        Commands::Reindex => {
            commands::reindex::run(config).await?;
        }
        Commands::Stats => {
            commands::stats::run(config).await?;
        }
    }

    Ok(())
}

/// Environment overrides for the settings people actually tune per
/// deployment. The config file remains the source of defaults.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = std::env::var("MAX_PAGES") {
        if let Ok(n) = v.parse::<u64>() {
            config.crawler.max_pages = n;
        }
    }
    if let Ok(v) = std::env::var("DELAY_BETWEEN_REQUESTS") {
        if let Ok(n) = v.parse::<f64>() {
            config.crawler.delay_between_requests = n;
        }
    }
    if let Ok(v) = std::env::var("REQUEST_TIMEOUT") {
        if let Ok(n) = v.parse::<u64>() {
            config.crawler.request_timeout_seconds = n;
        }
    }
    if let Ok(v) = std::env::var("MIN_CONTENT_LENGTH") {
        if let Ok(n) = v.parse::<usize>() {
            config.crawler.min_content_length = n;
        }
    }
    if let Ok(v) = std::env::var("CRAWL_WORKERS") {
        if let Ok(n) = v.parse::<usize>() {
            if n > 0 && n <= 128 {
                config.crawler.workers = n;
            }
        }
    }
    if let Ok(v) = std::env::var("DATABASE_URL") {
        config.database.url = v;
    }
    if let Ok(v) = std::env::var("REDIS_URL") {
        config.frontier.redis_url = v;
    }
    if let Ok(v) = std::env::var("ELASTICSEARCH_URL") {
        config.elasticsearch.url = v;
    }
    if let Ok(v) = std::env::var("FRONTIER_IN_MEMORY") {
        config.frontier.in_memory = v != "0" && v.to_lowercase() != "false";
    }
}
