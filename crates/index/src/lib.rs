//! Bridge between the content store and the external full-text index.
//! Documents are keyed by `content_hash`, so indexing the same content
//! twice is an idempotent upsert and the whole index can be rebuilt
//! from the store of record at any time.
//!
//! When the cluster is unreachable the bridge degrades to store-only:
//! every write path still lands in the store, the index side is
//! skipped.

mod client;
mod mapping;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use url::Url;

use pagesift_core::{text, AppConfig, Document};
use pagesift_storage::ContentStore;

pub use client::EsClient;
pub use mapping::content_mapping;

/// How many stored documents a full rebuild reads back.
const REINDEX_LIMIT: i64 = 10_000;
const KEYWORDS_PER_DOCUMENT: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_documents: i64,
    pub index_size: i64,
    pub index_available: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub index: bool,
    pub store: bool,
    /// The system runs store-only when the index is down, so overall
    /// health follows the store.
    pub overall: bool,
}

pub struct Indexer {
    es: Option<EsClient>,
    store: ContentStore,
    index_name: String,
}

impl Indexer {
    /// Try to reach the cluster; fall back to store-only when it is
    /// unreachable.
    pub async fn connect(config: &AppConfig, store: ContentStore) -> Self {
        let index_name = config.elasticsearch.index.clone();
        let es = match EsClient::new(&config.elasticsearch.url) {
            Ok(client) => match client.ping().await {
                Ok(()) => {
                    info!(url = %config.elasticsearch.url, "connected to search index");
                    Some(client)
                }
                Err(e) => {
                    warn!("search index unavailable, continuing store-only: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("search client setup failed, continuing store-only: {}", e);
                None
            }
        };

        let indexer = Self { es, store, index_name };
        if indexer.es.is_some() {
            if let Err(e) = indexer.ensure_index().await {
                warn!("could not prepare index mapping: {}", e);
            }
        }
        indexer
    }

    /// Store-only bridge; the index side of every operation is a no-op.
    pub fn store_only(store: ContentStore, index_name: String) -> Self {
        Self { es: None, store, index_name }
    }

    pub fn index_available(&self) -> bool {
        self.es.is_some()
    }

    async fn ensure_index(&self) -> anyhow::Result<()> {
        let Some(es) = &self.es else { return Ok(()) };
        if !es.index_exists(&self.index_name).await? {
            es.create_index(&self.index_name, &content_mapping()).await?;
            info!(index = %self.index_name, "created search index");
        }
        Ok(())
    }

    /// Upsert one document into the index, then persist it. The store
    /// is written unconditionally so it stays the source of truth even
    /// when the index write fails. Returns false only on an index
    /// write failure.
    pub async fn index(&self, doc: &Document) -> bool {
        let ok = self.mirror(doc).await;
        self.store.save(doc).await;
        ok
    }

    /// The index half of [`Indexer::index`]: upsert by `content_hash`,
    /// absorbing failures.
    async fn mirror(&self, doc: &Document) -> bool {
        let Some(es) = &self.es else { return true };
        let payload = prepare_document(doc);
        match es.put_doc(&self.index_name, &doc.content_hash, &payload).await {
            Ok(()) => true,
            Err(e) => {
                error!(url = %doc.url, "index write failed: {}", e);
                false
            }
        }
    }

    /// Bulk-upsert prepared documents; every document is persisted to
    /// the store regardless. Returns how many the index accepted.
    pub async fn bulk_index(&self, docs: &[Document]) -> usize {
        let mut accepted = 0;

        if let Some(es) = &self.es {
            if !docs.is_empty() {
                let mut body = String::new();
                for doc in docs {
                    let action =
                        json!({ "index": { "_index": self.index_name, "_id": doc.content_hash } });
                    body.push_str(&action.to_string());
                    body.push('\n');
                    body.push_str(&prepare_document(doc).to_string());
                    body.push('\n');
                }

                match es.bulk(body).await {
                    Ok(response) => {
                        accepted = count_accepted(&response);
                        info!(accepted, total = docs.len(), "bulk indexed");
                    }
                    Err(e) => error!("bulk indexing failed: {}", e),
                }
            }
        }

        for doc in docs {
            self.store.save(doc).await;
        }

        accepted
    }

    /// Rebuild the index from the store: read the most recent
    /// documents, recreate the index, bulk-index everything.
    pub async fn reindex_all(&self) -> usize {
        let docs = match self.store.get_recent(REINDEX_LIMIT).await {
            Ok(docs) => docs,
            Err(e) => {
                error!("reindex aborted, store read failed: {}", e);
                return 0;
            }
        };
        if docs.is_empty() {
            info!("no content to reindex");
            return 0;
        }

        if let Some(es) = &self.es {
            if let Err(e) = es.delete_index(&self.index_name).await {
                warn!("could not drop index before reindex: {}", e);
            }
            if let Err(e) = es.create_index(&self.index_name, &content_mapping()).await {
                error!("could not recreate index: {}", e);
            }
        }

        let count = self.bulk_index(&docs).await;
        info!(count, "reindex complete");
        count
    }

    /// Remove a document from the index. Absence (404) is success.
    pub async fn delete(&self, content_hash: &str) -> bool {
        let Some(es) = &self.es else { return true };
        match es.delete_doc(&self.index_name, content_hash).await {
            Ok(()) => true,
            Err(e) => {
                error!(content_hash, "index delete failed: {}", e);
                false
            }
        }
    }

    pub async fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total_documents: 0,
            index_size: 0,
            index_available: self.es.is_some(),
        };

        if let Some(es) = &self.es {
            match es.index_stats(&self.index_name).await {
                Ok(value) => {
                    let totals = &value["indices"][self.index_name.as_str()]["total"];
                    stats.total_documents = totals["docs"]["count"].as_i64().unwrap_or(0);
                    stats.index_size = totals["store"]["size_in_bytes"].as_i64().unwrap_or(0);
                }
                Err(e) => warn!("index stats unavailable: {}", e),
            }
        }

        if stats.total_documents == 0 {
            if let Ok(store_stats) = self.store.stats().await {
                stats.total_documents = store_stats.total_content;
            }
        }

        stats
    }

    pub async fn health(&self) -> Health {
        let index = match &self.es {
            Some(es) => es.cluster_health().await.is_ok(),
            None => false,
        };
        let store = self.store.stats().await.is_ok();
        Health { index, store, overall: store }
    }
}

/// Flatten a document into its indexing payload: derived domain,
/// frequency keywords, cleaned text fields, and the indexing timestamp.
fn prepare_document(doc: &Document) -> Value {
    let domain = Url::parse(&doc.url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default();

    let title = doc.title.clone().unwrap_or_default();
    let combined = format!("{} {}", title, doc.content);
    let keywords = text::extract_keywords(&combined, KEYWORDS_PER_DOCUMENT);

    json!({
        "url": doc.url,
        "title": text::clean_text(&title),
        "content": text::clean_text(&doc.content),
        "description": doc.description.clone().unwrap_or_default(),
        "author": doc.author,
        "tags": doc.tags,
        "keywords": keywords,
        "publish_date": doc.publish_date,
        "indexed_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "word_count": doc.word_count,
        "reading_time": doc.reading_time,
        "readability_score": doc.readability_score,
        "domain": domain,
        "content_hash": doc.content_hash,
    })
}

fn count_accepted(response: &Value) -> usize {
    response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item["index"]["status"]
                        .as_u64()
                        .is_some_and(|status| status == 200 || status == 201)
                })
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesift_core::text;

    fn doc(url: &str, content: &str) -> Document {
        Document {
            url: url.to_string(),
            title: Some("Crawling the web with Rust".to_string()),
            description: None,
            content: content.to_string(),
            author: None,
            publish_date: None,
            tags: vec!["rust".to_string()],
            word_count: content.split_whitespace().count() as u32,
            reading_time: 1,
            readability_score: None,
            extracted_at: Utc::now(),
            content_hash: text::content_hash(content),
        }
    }

    #[test]
    fn test_prepare_document_payload() {
        let d = doc(
            "https://blog.example.com/article/rust",
            "Crawler crawler crawler pipelines pipelines extraction",
        );
        let payload = prepare_document(&d);

        assert_eq!(payload["domain"], "blog.example.com");
        assert_eq!(payload["content_hash"], d.content_hash);
        let keywords: Vec<String> = payload["keywords"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keywords[0], "crawler");
        assert!(payload["indexed_at"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_count_accepted_reads_bulk_statuses() {
        let response = json!({
            "items": [
                { "index": { "status": 201 } },
                { "index": { "status": 200 } },
                { "index": { "status": 429 } },
            ]
        });
        assert_eq!(count_accepted(&response), 2);
        assert_eq!(count_accepted(&json!({})), 0);
    }

    #[tokio::test]
    async fn test_store_only_index_keeps_store_as_truth() {
        let store = ContentStore::in_memory().await.unwrap();
        let indexer = Indexer::store_only(store.clone(), "web_content".to_string());

        let d = doc("https://example.com/article/a", "some body text worth keeping");
        assert!(indexer.index(&d).await);
        assert!(!indexer.index_available());

        let recent = store.get_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content_hash, d.content_hash);

        let health = indexer.health().await;
        assert!(!health.index);
        assert!(health.store);
        assert_eq!(health.overall, health.store);

        let stats = indexer.stats().await;
        assert_eq!(stats.total_documents, 1);
        assert!(!stats.index_available);

        // nothing to remove from an absent index
        assert!(indexer.delete(&d.content_hash).await);
    }

    #[tokio::test]
    async fn test_bulk_index_store_fallback() {
        let store = ContentStore::in_memory().await.unwrap();
        let indexer = Indexer::store_only(store.clone(), "web_content".to_string());

        let docs = vec![
            doc("https://example.com/article/a", "first distinct body"),
            doc("https://example.com/article/b", "second distinct body"),
        ];
        // no index reachable: zero accepted, but both documents persist
        assert_eq!(indexer.bulk_index(&docs).await, 0);
        assert_eq!(store.get_recent(10).await.unwrap().len(), 2);
    }
}
