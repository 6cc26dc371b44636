use thiserror::Error;

/// Why a fetch produced no HTML.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timeout after {0}s")]
    Timeout(u64),

    #[error("http status {0}")]
    Http(u16),

    #[error("not html: {0}")]
    NonHtml(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The only fatal kind: the crawl loop cannot keep its
    /// visit-at-most-once guarantee without the frontier backend.
    #[error("frontier backend error: {0}")]
    Frontier(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("index error: {0}")]
    Index(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
