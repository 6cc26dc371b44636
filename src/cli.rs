use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "pagesift", about = "Focused web crawler with search and feeds")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl starting from seed URLs
    Crawl {
        /// Seed URLs
        #[arg(long, num_args = 1.., required = true)]
        urls: Vec<String>,

        /// Override the configured page budget
        #[arg(long)]
        max_pages: Option<u64>,
    },
    /// Search collected content
    Search {
        /// Full-text query
        #[arg(short, long)]
        query: String,

        /// Max results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Generate a syndication feed
    Feed {
        /// Restrict the feed to one topic/tag
        #[arg(long)]
        topic: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "rss")]
        format: FeedFormatArg,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check index and store health
    Index,
    /// Rebuild the full-text index from the store
    Reindex,
    /// Show crawl and index statistics
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeedFormatArg {
    Rss,
    Json,
}

impl From<FeedFormatArg> for pagesift_feed::FeedFormat {
    fn from(arg: FeedFormatArg) -> Self {
        match arg {
            FeedFormatArg::Rss => pagesift_feed::FeedFormat::Rss,
            FeedFormatArg::Json => pagesift_feed::FeedFormat::Json,
        }
    }
}
