use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: u64,
    #[serde(default = "default_delay")]
    pub delay_between_requests: f64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Reserved: fetch failures are currently terminal for a URL.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_useful_url_patterns")]
    pub useful_url_patterns: Vec<String>,
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FrontierConfig {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Trade restart resilience for a dependency-free frontier.
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_elasticsearch_url")]
    pub url: String,
    #[serde(default = "default_index_name")]
    pub index: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_title")]
    pub title: String,
    #[serde(default = "default_feed_description")]
    pub description: String,
    #[serde(default = "default_max_feed_items")]
    pub max_items: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            delay_between_requests: default_delay(),
            request_timeout_seconds: default_request_timeout(),
            max_retries: default_max_retries(),
            min_content_length: default_min_content_length(),
            workers: default_workers(),
            useful_url_patterns: default_useful_url_patterns(),
            excluded_extensions: default_excluded_extensions(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            max_connections_per_host: default_max_connections_per_host(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: default_database_url() }
    }
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self { redis_url: default_redis_url(), in_memory: false }
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self { url: default_elasticsearch_url(), index: default_index_name() }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: default_feed_title(),
            description: default_feed_description(),
            max_items: default_max_feed_items(),
        }
    }
}

fn default_max_pages() -> u64 { 1000 }
fn default_delay() -> f64 { 1.0 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 3 }
fn default_min_content_length() -> usize { 100 }
fn default_workers() -> usize { 4 }
fn default_max_connections() -> usize { 100 }
fn default_max_connections_per_host() -> usize { 10 }
fn default_user_agent() -> String {
    "pagesift/0.1 (+https://example.com/bot)".to_string()
}
fn default_database_url() -> String { "sqlite://pagesift.db".to_string() }
fn default_redis_url() -> String { "redis://127.0.0.1:6379/0".to_string() }
fn default_elasticsearch_url() -> String { "http://localhost:9200".to_string() }
fn default_index_name() -> String { "web_content".to_string() }
fn default_feed_title() -> String { "Pagesift Feed".to_string() }
fn default_feed_description() -> String {
    "Curated content from web crawling".to_string()
}
fn default_max_feed_items() -> usize { 50 }

fn default_useful_url_patterns() -> Vec<String> {
    ["/article/", "/blog/", "/news/", "/post/", "/story/", "/content/", "/page/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excluded_extensions() -> Vec<String> {
    [".pdf", ".jpg", ".jpeg", ".png", ".gif", ".mp4", ".avi", ".zip", ".exe", ".css", ".js"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
