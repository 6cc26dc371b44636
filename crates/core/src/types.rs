use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the extractor distills from a page. Append-only in the store;
/// mirrored into the full-text index under `content_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub author: Option<String>,
    /// ISO-8601 when a parseable date was found on the page.
    pub publish_date: Option<String>,
    pub tags: Vec<String>,
    pub word_count: u32,
    /// Minutes, floored at 1 for any non-empty content.
    pub reading_time: u32,
    pub readability_score: Option<f64>,
    pub extracted_at: DateTime<Utc>,
    /// MD5 of the normalized content; unique in the store, document id
    /// in the index.
    pub content_hash: String,
}

/// Queue-side metadata kept per pending URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    pub domain: String,
    pub priority: i64,
    pub added_at: DateTime<Utc>,
}
