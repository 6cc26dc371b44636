//! The crawl frontier: a priority queue of pending URLs plus the set of
//! URLs already visited, both keyed by the normalized-URL hash.

mod memory;
mod redis;

use async_trait::async_trait;

use pagesift_core::CrawlError;

pub use self::memory::MemoryFrontier;
pub use self::redis::RedisFrontier;

/// Seeds outrank every discovered link.
pub const SEED_PRIORITY: i64 = 10;
pub const LINK_PRIORITY: i64 = 1;

/// Queue + visited-set contract shared by the redis and in-memory
/// backings. Callers pass normalized URLs; identity is the MD5 of the
/// normalized form.
///
/// Re-adding a queued URL can only raise its priority, and a URL that
/// has been marked crawled is never enqueued again. Between `next()`
/// and `mark_crawled()` a URL is neither queued nor visited; a crash in
/// that window leaves it requeueable, which downstream content dedup
/// absorbs.
#[async_trait]
pub trait Frontier: Send + Sync + 'static {
    /// Queue a URL. Returns false when it was already crawled.
    async fn add(&self, url: &str, priority: i64) -> Result<bool, CrawlError>;

    /// Pop the highest-priority URL; equal priorities pop the lexically
    /// greatest URL first. None when the queue is empty.
    async fn next(&self) -> Result<Option<String>, CrawlError>;

    async fn mark_crawled(&self, url: &str) -> Result<(), CrawlError>;

    async fn is_crawled(&self, url: &str) -> Result<bool, CrawlError>;

    /// Pending queue size.
    async fn len(&self) -> Result<usize, CrawlError>;
}
