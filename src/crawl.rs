//! The crawl loop: workers drain the frontier, fetch pages, extract
//! content, hand documents to the indexing bridge, and push discovered
//! links back into the frontier. Any per-URL failure is absorbed; only
//! a frontier backend failure aborts the crawl.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use regex::RegexBuilder;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use url::Url;

use pagesift_core::config::CrawlerConfig;
use pagesift_core::{urls, AppConfig, CrawlError};
use pagesift_fetch::{HttpFetcher, PageFetcher};
use pagesift_frontier::{Frontier, MemoryFrontier, RedisFrontier, LINK_PRIORITY, SEED_PRIORITY};
use pagesift_index::Indexer;
use pagesift_storage::ContentStore;

/// Link filter rules, compiled once per crawl.
struct LinkFilters {
    useful_patterns: Vec<regex::Regex>,
    excluded_extensions: Vec<String>,
}

impl LinkFilters {
    fn from_config(config: &CrawlerConfig) -> Result<Self> {
        let useful_patterns = config
            .useful_url_patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { useful_patterns, excluded_extensions: config.excluded_extensions.clone() })
    }

    /// Valid URL, no excluded extension, and at least one useful
    /// pattern must match.
    fn should_enqueue(&self, url: &Url) -> bool {
        if !urls::is_valid(url.as_str()) {
            return false;
        }
        if urls::has_excluded_extension(url, &self.excluded_extensions) {
            return false;
        }
        self.useful_patterns.iter().any(|re| re.is_match(url.as_str()))
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub async fn run_crawl(config: AppConfig, seeds: Vec<String>) -> Result<()> {
    let store = ContentStore::connect(&config.database.url).await?;

    let frontier: Arc<dyn Frontier> = if config.frontier.in_memory {
        info!("using in-memory frontier");
        Arc::new(MemoryFrontier::new())
    } else {
        Arc::new(
            RedisFrontier::connect(&config.frontier.redis_url)
                .await
                .map_err(|e| anyhow!("frontier backend unavailable: {}", e))?,
        )
    };

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config)?);
    let indexer = Arc::new(Indexer::connect(&config, store).await);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(());
            }
        });
    }

    let crawled = run_loop(config, seeds, frontier, fetcher, indexer, shutdown_tx).await?;
    info!(pages = crawled, "crawl complete");
    Ok(())
}

async fn run_loop(
    config: AppConfig,
    seeds: Vec<String>,
    frontier: Arc<dyn Frontier>,
    fetcher: Arc<dyn PageFetcher>,
    indexer: Arc<Indexer>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<u64> {
    let filters = Arc::new(LinkFilters::from_config(&config.crawler)?);

    let mut seeded = 0usize;
    for raw in &seeds {
        let normalized = urls::normalize(raw);
        if !urls::is_valid(&normalized) {
            warn!(url = %raw, "skipping invalid seed");
            continue;
        }
        if frontier
            .add(&normalized, SEED_PRIORITY)
            .await
            .map_err(|e| anyhow!("frontier backend unavailable: {}", e))?
        {
            seeded += 1;
        }
    }
    info!(count = seeded, "seeds loaded");

    let config = Arc::new(config);
    let crawled = Arc::new(AtomicU64::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));

    info!(workers = config.crawler.workers, "spawning crawl workers");
    let mut handles = Vec::new();
    for worker_id in 0..config.crawler.workers {
        let config = Arc::clone(&config);
        let frontier = Arc::clone(&frontier);
        let fetcher = Arc::clone(&fetcher);
        let indexer = Arc::clone(&indexer);
        let filters = Arc::clone(&filters);
        let crawled = Arc::clone(&crawled);
        let in_flight = Arc::clone(&in_flight);
        let shutdown = shutdown_tx.subscribe();

        handles.push(tokio::spawn(worker(
            worker_id, config, frontier, fetcher, indexer, filters, crawled, in_flight, shutdown,
        )));
    }

    let mut backend_failed = false;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("worker aborted: {}", e);
                backend_failed = true;
            }
            Err(e) => {
                error!("worker panicked: {}", e);
                backend_failed = true;
            }
        }
    }
    if backend_failed {
        bail!("crawl aborted: frontier backend failure");
    }

    Ok(crawled.load(Ordering::SeqCst))
}

#[allow(clippy::too_many_arguments)]
async fn worker(
    worker_id: usize,
    config: Arc<AppConfig>,
    frontier: Arc<dyn Frontier>,
    fetcher: Arc<dyn PageFetcher>,
    indexer: Arc<Indexer>,
    filters: Arc<LinkFilters>,
    crawled: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), CrawlError> {
    debug!(worker_id, "worker started");
    loop {
        // cancellation is checked between iterations; in-flight fetches
        // run to completion
        if shutdown.try_recv().is_ok() {
            info!(worker_id, "worker shutting down");
            break;
        }
        if crawled.load(Ordering::SeqCst) >= config.crawler.max_pages {
            break;
        }

        let Some(url_str) = frontier.next().await? else {
            // queue is empty; exit once nothing is still being processed
            if in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
            continue;
        };

        let _guard = InFlightGuard::enter(&in_flight);

        if frontier.is_crawled(&url_str).await? {
            continue;
        }
        // claim a budget slot; failed fetches count too
        if crawled.fetch_add(1, Ordering::SeqCst) >= config.crawler.max_pages {
            crawled.fetch_sub(1, Ordering::SeqCst);
            break;
        }

        process_url(worker_id, &url_str, &config, &frontier, &fetcher, &indexer, &filters)
            .await?;
        drop(_guard);

        let host = urls::host_of(&url_str).unwrap_or_default();
        let delay = urls::rate_limit_delay(&host, config.crawler.delay_between_requests);
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }
    Ok(())
}

/// One URL through the pipeline. Fetch, extract, and store failures
/// are logged and absorbed; frontier errors propagate and kill the
/// crawl.
#[allow(clippy::too_many_arguments)]
async fn process_url(
    worker_id: usize,
    url_str: &str,
    config: &AppConfig,
    frontier: &Arc<dyn Frontier>,
    fetcher: &Arc<dyn PageFetcher>,
    indexer: &Arc<Indexer>,
    filters: &LinkFilters,
) -> Result<(), CrawlError> {
    let Ok(url) = Url::parse(url_str) else {
        warn!(worker_id, url = %url_str, "unparseable URL in frontier");
        frontier.mark_crawled(url_str).await?;
        return Ok(());
    };

    info!(worker_id, url = %url, "fetching");
    let html = match fetcher.get(&url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(worker_id, url = %url, "fetch failed: {}", e);
            frontier.mark_crawled(url_str).await?;
            return Ok(());
        }
    };

    match pagesift_extract::extract(&url, &html) {
        Some(doc) if doc.content.len() >= config.crawler.min_content_length => {
            indexer.index(&doc).await;
            info!(worker_id, url = %url, words = doc.word_count, "content extracted");
        }
        Some(_) => debug!(worker_id, url = %url, "content below minimum length"),
        None => debug!(worker_id, url = %url, "no article content found"),
    }

    // links are harvested even from pages that yielded no document
    let mut enqueued = 0usize;
    for link in pagesift_extract::extract_links(&url, &html) {
        if !filters.should_enqueue(&link) {
            continue;
        }
        let normalized = urls::normalize(link.as_str());
        if frontier.add(&normalized, LINK_PRIORITY).await? {
            enqueued += 1;
        }
    }
    if enqueued > 0 {
        debug!(worker_id, url = %url, enqueued, "links enqueued");
    }

    frontier.mark_crawled(url_str).await?;
    Ok(())
}
