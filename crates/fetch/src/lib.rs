//! Bounded-concurrency HTML fetcher. Yields page text only for
//! `200 OK` responses that declare `text/html`; everything else maps
//! onto a [`FetchError`] reason. Retries are deliberately absent;
//! a failed URL is the crawl loop's problem.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Semaphore;
use tracing::debug;
use url::Url;

use pagesift_core::{AppConfig, FetchError};

/// Seam between the crawl loop and HTTP. Tests substitute a stub.
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    async fn get(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
    global: Arc<Semaphore>,
    per_host: DashMap<String, Arc<Semaphore>>,
    per_host_limit: usize,
    timeout_seconds: u64,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout_seconds = config.crawler.request_timeout_seconds;
        let client = reqwest::Client::builder()
            .user_agent(config.fetch.user_agent.clone())
            .timeout(Duration::from_secs(timeout_seconds))
            .pool_max_idle_per_host(config.fetch.max_connections_per_host)
            .build()?;

        Ok(Self {
            client,
            global: Arc::new(Semaphore::new(config.fetch.max_connections)),
            per_host: DashMap::new(),
            per_host_limit: config.fetch.max_connections_per_host,
            timeout_seconds,
        })
    }

    fn host_permit(&self, host: &str) -> Arc<Semaphore> {
        self.per_host
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let _global = self
            .global
            .acquire()
            .await
            .map_err(|_| FetchError::Transport("connection pool closed".into()))?;
        let host_sem = self.host_permit(url.host_str().unwrap_or_default());
        let _host = host_sem
            .acquire()
            .await
            .map_err(|_| FetchError::Transport("connection pool closed".into()))?;

        debug!(url = %url, "fetching");
        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_seconds)
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Http(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("text/html") {
            return Err(FetchError::NonHtml(content_type));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_seconds)
            } else {
                FetchError::Transport(e.to_string())
            }
        })
    }
}
