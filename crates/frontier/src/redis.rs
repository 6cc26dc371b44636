use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashSet;
use tracing::info;
use url::Url;

use pagesift_core::{urls, CrawlError};

use crate::Frontier;

const QUEUE_KEY: &str = "crawl_queue";
const VISITED_KEY: &str = "crawled_urls";

fn backend_err(e: ::redis::RedisError) -> CrawlError {
    CrawlError::Frontier(e.to_string())
}

/// Redis-backed frontier: `crawl_queue` sorted set (URL -> priority),
/// `crawled_urls` set of URL hashes, and a `url_data:{hash}` hash per
/// pending URL. Survives process restarts; an in-process hot cache
/// short-circuits repeat visited checks.
pub struct RedisFrontier {
    conn: ConnectionManager,
    hot_visited: DashSet<String>,
}

impl RedisFrontier {
    pub async fn connect(redis_url: &str) -> Result<Self, CrawlError> {
        let client = Client::open(redis_url).map_err(backend_err)?;
        let conn = ConnectionManager::new(client).await.map_err(backend_err)?;
        info!(url = %redis_url, "connected to frontier backend");
        Ok(Self { conn, hot_visited: DashSet::new() })
    }
}

#[async_trait]
impl Frontier for RedisFrontier {
    async fn add(&self, url: &str, priority: i64) -> Result<bool, CrawlError> {
        if self.is_crawled(url).await? {
            return Ok(false);
        }

        let hash = urls::url_hash(url);
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();
        let mut conn = self.conn.clone();

        // GT: re-adding only ever raises the priority
        let _: () = ::redis::cmd("ZADD")
            .arg(QUEUE_KEY)
            .arg("GT")
            .arg(priority)
            .arg(url)
            .query_async(&mut conn)
            .await
            .map_err(backend_err)?;

        let added_timestamp = Utc::now().timestamp().to_string();
        let _: () = conn
            .hset_multiple(
                format!("url_data:{}", hash),
                &[
                    ("url", url),
                    ("domain", domain.as_str()),
                    ("added_timestamp", added_timestamp.as_str()),
                ],
            )
            .await
            .map_err(backend_err)?;

        Ok(true)
    }

    async fn next(&self) -> Result<Option<String>, CrawlError> {
        let mut conn = self.conn.clone();
        let popped: Vec<(String, f64)> =
            conn.zpopmax(QUEUE_KEY, 1).await.map_err(backend_err)?;
        Ok(popped.into_iter().next().map(|(url, _score)| url))
    }

    async fn mark_crawled(&self, url: &str) -> Result<(), CrawlError> {
        let hash = urls::url_hash(url);
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(VISITED_KEY, &hash).await.map_err(backend_err)?;
        self.hot_visited.insert(hash);
        Ok(())
    }

    async fn is_crawled(&self, url: &str) -> Result<bool, CrawlError> {
        let hash = urls::url_hash(url);
        if self.hot_visited.contains(&hash) {
            return Ok(true);
        }
        let mut conn = self.conn.clone();
        let member: bool = conn.sismember(VISITED_KEY, &hash).await.map_err(backend_err)?;
        if member {
            // promote into the hot cache
            self.hot_visited.insert(hash);
        }
        Ok(member)
    }

    async fn len(&self) -> Result<usize, CrawlError> {
        let mut conn = self.conn.clone();
        conn.zcard(QUEUE_KEY).await.map_err(backend_err)
    }
}
