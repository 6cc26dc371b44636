//! Durable record of extracted documents. A local SQLite table is the
//! store of record; the full-text index is rebuilt from here.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

use pagesift_core::Document;

#[derive(Debug, Clone)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub total_content: i64,
    pub content_today: i64,
    pub top_tags: Vec<TagCount>,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    url: String,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    author: Option<String>,
    publish_date: Option<String>,
    tags: Option<String>,
    word_count: Option<i64>,
    reading_time: Option<i64>,
    readability_score: Option<f64>,
    extracted_at: Option<String>,
    content_hash: Option<String>,
}

const DOCUMENT_COLUMNS: &str = "url, title, description, content, author, publish_date, tags, \
     word_count, reading_time, readability_score, extracted_at, content_hash";

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let tags = row
            .tags
            .as_deref()
            .and_then(|t| serde_json::from_str(t).ok())
            .unwrap_or_default();
        let extracted_at = row
            .extracted_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Document {
            url: row.url,
            title: row.title,
            description: row.description,
            content: row.content.unwrap_or_default(),
            author: row.author,
            publish_date: row.publish_date,
            tags,
            word_count: row.word_count.unwrap_or(0).max(0) as u32,
            reading_time: row.reading_time.unwrap_or(0).max(0) as u32,
            readability_score: row.readability_score,
            extracted_at,
            content_hash: row.content_hash.unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct ContentStore {
    pool: SqlitePool,
}

impl ContentStore {
    /// Open (creating if missing) and initialize the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private throwaway database for tests. Single connection: each
    /// sqlite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_init.sql"))
            .execute(&self.pool)
            .await?;
        info!("content store ready");
        Ok(())
    }

    /// Idempotent insert keyed by `content_hash` (and `url`). Returns
    /// false for duplicates and for write failures; the crawl loop
    /// never sees a storage error.
    pub async fn save(&self, doc: &Document) -> bool {
        let tags_json = serde_json::to_string(&doc.tags).unwrap_or_else(|_| "[]".to_string());
        let extracted_at = doc.extracted_at.to_rfc3339_opts(SecondsFormat::Secs, true);

        let result = sqlx::query(
            "INSERT OR IGNORE INTO content (url, title, description, content, author, \
             publish_date, tags, word_count, reading_time, readability_score, extracted_at, \
             content_hash) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&doc.url)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(&doc.content)
        .bind(&doc.author)
        .bind(&doc.publish_date)
        .bind(&tags_json)
        .bind(doc.word_count as i64)
        .bind(doc.reading_time as i64)
        .bind(doc.readability_score)
        .bind(&extracted_at)
        .bind(&doc.content_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                debug!(url = %doc.url, "content saved");
                true
            }
            Ok(_) => {
                // duplicate url or content_hash; expected, not a fault
                debug!(url = %doc.url, "duplicate content, skipped");
                false
            }
            Err(e) => {
                error!(url = %doc.url, "content save failed: {}", e);
                false
            }
        }
    }

    pub async fn get_recent(&self, limit: i64) -> Result<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM content ORDER BY extracted_at DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    /// Substring match over tags, title, and content.
    pub async fn get_by_topic(&self, topic: &str, limit: i64) -> Result<Vec<Document>> {
        let pattern = format!("%{}%", topic);
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM content \
             WHERE tags LIKE ?1 OR title LIKE ?1 OR content LIKE ?1 \
             ORDER BY extracted_at DESC LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    /// Local fallback search: title matches rank above description
    /// matches, which rank above content-only matches; newest first
    /// within each bucket.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Document>> {
        let pattern = format!("%{}%", query);
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM content \
             WHERE title LIKE ?1 OR description LIKE ?1 OR content LIKE ?1 \
             ORDER BY CASE \
                 WHEN title LIKE ?1 THEN 1 \
                 WHEN description LIKE ?1 THEN 2 \
                 ELSE 3 \
             END, extracted_at DESC \
             LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content")
            .fetch_one(&self.pool)
            .await?;

        let (today,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM content WHERE DATE(extracted_at) = DATE('now')")
                .fetch_one(&self.pool)
                .await?;

        let tag_rows: Vec<(String,)> = sqlx::query_as(
            "SELECT tags FROM content WHERE tags IS NOT NULL AND tags != '[]'",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts: HashMap<String, i64> = HashMap::new();
        for (tags_json,) in tag_rows {
            let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
            for tag in tags {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
        let mut top_tags: Vec<TagCount> =
            counts.into_iter().map(|(tag, count)| TagCount { tag, count }).collect();
        top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        top_tags.truncate(10);

        Ok(StoreStats { total_content: total, content_today: today, top_tags })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pagesift_core::text;

    fn doc(url: &str, content: &str, hours_ago: i64) -> Document {
        Document {
            url: url.to_string(),
            title: Some(format!("Title for {}", url)),
            description: Some("A description".to_string()),
            content: content.to_string(),
            author: None,
            publish_date: None,
            tags: vec!["rust".to_string(), "crawling".to_string()],
            word_count: content.split_whitespace().count() as u32,
            reading_time: 1,
            readability_score: Some(70.0),
            extracted_at: Utc::now() - chrono::Duration::hours(hours_ago),
            content_hash: text::content_hash(content),
        }
    }

    #[tokio::test]
    async fn test_save_then_read_back() {
        let store = ContentStore::in_memory().await.unwrap();
        assert!(store.save(&doc("https://example.com/article/a", "first body text", 0)).await);

        let recent = store.get_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].url, "https://example.com/article/a");
        assert_eq!(recent[0].content, "first body text");
        assert_eq!(recent[0].tags, vec!["rust".to_string(), "crawling".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_content_hash_is_rejected() {
        let store = ContentStore::in_memory().await.unwrap();
        let first = doc("https://a.example.com/article/1", "identical body", 0);
        let second = doc("https://b.example.com/article/2", "identical body", 0);
        assert_eq!(first.content_hash, second.content_hash);

        assert!(store.save(&first).await);
        assert!(!store.save(&second).await);

        let recent = store.get_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].url, "https://a.example.com/article/1");
    }

    #[tokio::test]
    async fn test_duplicate_url_is_rejected() {
        let store = ContentStore::in_memory().await.unwrap();
        assert!(store.save(&doc("https://example.com/article/a", "one body", 0)).await);
        assert!(!store.save(&doc("https://example.com/article/a", "another body", 0)).await);
    }

    #[tokio::test]
    async fn test_get_recent_orders_newest_first() {
        let store = ContentStore::in_memory().await.unwrap();
        store.save(&doc("https://example.com/article/old", "old body", 48)).await;
        store.save(&doc("https://example.com/article/new", "new body", 1)).await;

        let recent = store.get_recent(10).await.unwrap();
        assert_eq!(recent[0].url, "https://example.com/article/new");
        assert_eq!(recent[1].url, "https://example.com/article/old");
    }

    #[tokio::test]
    async fn test_search_ranks_title_over_description_over_content() {
        let store = ContentStore::in_memory().await.unwrap();

        let mut content_only = doc("https://example.com/article/c", "about ferrets mostly", 0);
        content_only.title = Some("Unrelated".to_string());
        content_only.description = Some("Unrelated".to_string());

        let mut desc_match = doc("https://example.com/article/d", "plain body", 0);
        desc_match.title = Some("Unrelated".to_string());
        desc_match.description = Some("all about ferrets".to_string());

        let mut title_match = doc("https://example.com/article/t", "other body", 24);
        title_match.title = Some("ferrets at home".to_string());

        store.save(&content_only).await;
        store.save(&desc_match).await;
        store.save(&title_match).await;

        let results = store.search("ferrets", 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].url, "https://example.com/article/t");
        assert_eq!(results[1].url, "https://example.com/article/d");
        assert_eq!(results[2].url, "https://example.com/article/c");
    }

    #[tokio::test]
    async fn test_get_by_topic_matches_tags() {
        let store = ContentStore::in_memory().await.unwrap();
        store.save(&doc("https://example.com/article/a", "body one", 0)).await;

        let mut untagged = doc("https://example.com/article/b", "body two", 0);
        untagged.tags = vec![];
        untagged.title = Some("plain".to_string());
        store.save(&untagged).await;

        let hits = store.get_by_topic("crawling", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://example.com/article/a");
    }

    #[tokio::test]
    async fn test_stats_counts_and_top_tags() {
        let store = ContentStore::in_memory().await.unwrap();
        store.save(&doc("https://example.com/article/a", "today body", 0)).await;

        let mut old = doc("https://example.com/article/b", "old body", 0);
        old.extracted_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        old.tags = vec!["rust".to_string()];
        store.save(&old).await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_content, 2);
        assert_eq!(stats.content_today, 1);
        assert_eq!(stats.top_tags[0].tag, "rust");
        assert_eq!(stats.top_tags[0].count, 2);
    }
}
