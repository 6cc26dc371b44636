use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use priority_queue::PriorityQueue;
use tokio::sync::Mutex;
use url::Url;

use pagesift_core::{urls, CrawlError, FrontierEntry};

use crate::Frontier;

/// Priority wrapper: higher score pops first, ties pop the lexically
/// greatest URL (matching what redis ZPOPMAX does natively).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Priority {
    score: i64,
    url: String,
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score).then_with(|| self.url.cmp(&other.url))
    }
}

/// In-process frontier: a priority queue behind a mutex plus a visited
/// hash set. Same interface as [`RedisFrontier`], minus restart
/// resilience.
pub struct MemoryFrontier {
    queue: Mutex<PriorityQueue<String, Priority>>,
    entries: DashMap<String, FrontierEntry>,
    visited: DashSet<String>,
}

impl Default for MemoryFrontier {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFrontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(PriorityQueue::new()),
            entries: DashMap::new(),
            visited: DashSet::new(),
        }
    }

    /// Metadata recorded at add time, kept while the URL is pending.
    pub fn entry(&self, url: &str) -> Option<FrontierEntry> {
        self.entries.get(&urls::url_hash(url)).map(|e| e.value().clone())
    }
}

#[async_trait]
impl Frontier for MemoryFrontier {
    async fn add(&self, url: &str, priority: i64) -> Result<bool, CrawlError> {
        let hash = urls::url_hash(url);
        if self.visited.contains(&hash) {
            return Ok(false);
        }

        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        self.entries.insert(
            hash,
            FrontierEntry {
                url: url.to_string(),
                domain,
                priority,
                added_at: Utc::now(),
            },
        );

        let mut queue = self.queue.lock().await;
        // push_increase keeps the max priority when the URL is already queued
        queue.push_increase(url.to_string(), Priority { score: priority, url: url.to_string() });
        Ok(true)
    }

    async fn next(&self) -> Result<Option<String>, CrawlError> {
        let mut queue = self.queue.lock().await;
        let popped = queue.pop().map(|(url, _priority)| url);
        if let Some(url) = &popped {
            self.entries.remove(&urls::url_hash(url));
        }
        Ok(popped)
    }

    async fn mark_crawled(&self, url: &str) -> Result<(), CrawlError> {
        self.visited.insert(urls::url_hash(url));
        Ok(())
    }

    async fn is_crawled(&self, url: &str) -> Result<bool, CrawlError> {
        Ok(self.visited.contains(&urls::url_hash(url)))
    }

    async fn len(&self) -> Result<usize, CrawlError> {
        Ok(self.queue.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_priority_order_beats_insertion_order() {
        let frontier = MemoryFrontier::new();
        frontier.add("https://example.com/blog/low", 1).await.unwrap();
        frontier.add("https://example.com/article/seed", 10).await.unwrap();

        assert_eq!(
            frontier.next().await.unwrap().as_deref(),
            Some("https://example.com/article/seed")
        );
        assert_eq!(
            frontier.next().await.unwrap().as_deref(),
            Some("https://example.com/blog/low")
        );
        assert_eq!(frontier.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_visit_at_most_once() {
        let frontier = MemoryFrontier::new();
        let url = "https://example.com/article/a";

        assert!(frontier.add(url, 10).await.unwrap());
        assert_eq!(frontier.next().await.unwrap().as_deref(), Some(url));
        frontier.mark_crawled(url).await.unwrap();

        // re-adding a crawled URL is a no-op
        assert!(!frontier.add(url, 10).await.unwrap());
        assert_eq!(frontier.next().await.unwrap(), None);
        assert!(frontier.is_crawled(url).await.unwrap());
    }

    #[tokio::test]
    async fn test_readd_takes_max_priority() {
        let frontier = MemoryFrontier::new();
        frontier.add("https://example.com/article/seed", 10).await.unwrap();
        frontier.add("https://example.com/blog/other", 5).await.unwrap();
        // a late low-priority add must not demote the seed
        frontier.add("https://example.com/article/seed", 1).await.unwrap();

        assert_eq!(
            frontier.next().await.unwrap().as_deref(),
            Some("https://example.com/article/seed")
        );
    }

    #[tokio::test]
    async fn test_equal_priority_pops_lexically_greatest() {
        let frontier = MemoryFrontier::new();
        frontier.add("https://example.com/blog/a", 1).await.unwrap();
        frontier.add("https://example.com/blog/b", 1).await.unwrap();

        assert_eq!(
            frontier.next().await.unwrap().as_deref(),
            Some("https://example.com/blog/b")
        );
    }

    #[tokio::test]
    async fn test_entry_metadata_recorded() {
        let frontier = MemoryFrontier::new();
        frontier.add("https://example.com/article/a", 10).await.unwrap();

        let entry = frontier.entry("https://example.com/article/a").unwrap();
        assert_eq!(entry.domain, "example.com");
        assert_eq!(entry.priority, 10);

        frontier.next().await.unwrap();
        assert!(frontier.entry("https://example.com/article/a").is_none());
    }

    #[tokio::test]
    async fn test_len_tracks_pending() {
        let frontier = MemoryFrontier::new();
        assert_eq!(frontier.len().await.unwrap(), 0);
        frontier.add("https://example.com/blog/a", 1).await.unwrap();
        frontier.add("https://example.com/blog/a", 3).await.unwrap();
        assert_eq!(frontier.len().await.unwrap(), 1);
    }
}
