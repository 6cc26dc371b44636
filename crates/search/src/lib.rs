//! User-facing search over the full-text index, with a local store
//! fallback when the cluster is down. Query construction lives here;
//! ranking quality is the index's problem.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use pagesift_core::{text, AppConfig};
use pagesift_index::EsClient;
use pagesift_storage::ContentStore;

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub publish_date: Option<String>,
    pub score: f64,
    pub highlights: HashMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub total: i64,
    pub took_ms: i64,
    pub hits: Vec<SearchHit>,
}

pub struct SearchEngine {
    es: Option<EsClient>,
    store: ContentStore,
    index_name: String,
}

impl SearchEngine {
    pub async fn connect(config: &AppConfig, store: ContentStore) -> Self {
        let index_name = config.elasticsearch.index.clone();
        let es = match EsClient::new(&config.elasticsearch.url) {
            Ok(client) => match client.ping().await {
                Ok(()) => Some(client),
                Err(e) => {
                    warn!("search index unavailable, falling back to local search: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("search client setup failed, falling back to local search: {}", e);
                None
            }
        };
        Self { es, store, index_name }
    }

    pub fn local_only(store: ContentStore, index_name: String) -> Self {
        Self { es: None, store, index_name }
    }

    /// Title hits outrank content hits; the tie-breaker is recency.
    pub fn build_query(query: &str, filters: &SearchFilters) -> Value {
        let mut filter_clauses: Vec<Value> = Vec::new();
        if let Some(author) = &filters.author {
            filter_clauses.push(json!({ "term": { "author": author } }));
        }
        if !filters.tags.is_empty() {
            filter_clauses.push(json!({ "terms": { "tags": filters.tags } }));
        }
        if filters.date_from.is_some() || filters.date_to.is_some() {
            let mut range = serde_json::Map::new();
            if let Some(from) = &filters.date_from {
                range.insert("gte".to_string(), json!(from));
            }
            if let Some(to) = &filters.date_to {
                range.insert("lte".to_string(), json!(to));
            }
            filter_clauses.push(json!({ "range": { "publish_date": range } }));
        }

        json!({
            "query": {
                "bool": {
                    "must": [
                        {
                            "multi_match": {
                                "query": query,
                                "fields": ["title^3", "content^2", "description"],
                                "type": "best_fields"
                            }
                        }
                    ],
                    "filter": filter_clauses
                }
            },
            "highlight": {
                "fields": {
                    "title": {},
                    "content": { "fragment_size": 150, "number_of_fragments": 3 }
                }
            },
            "sort": [
                { "_score": { "order": "desc" } },
                { "publish_date": { "order": "desc" } }
            ]
        })
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        size: usize,
        offset: usize,
    ) -> Result<SearchResults> {
        match &self.es {
            Some(es) => {
                let body = Self::build_query(query, filters);
                let response = es.search(&self.index_name, &body, size, offset).await?;
                Ok(parse_results(&response))
            }
            None => self.local_search(query, size).await,
        }
    }

    /// Store fallback: LIKE-ranked, no scores or highlights.
    async fn local_search(&self, query: &str, size: usize) -> Result<SearchResults> {
        info!("searching the local store");
        let docs = self.store.search(query, size as i64).await?;
        let hits = docs
            .into_iter()
            .map(|doc| SearchHit {
                title: doc.title.unwrap_or_else(|| "Untitled".to_string()),
                description: doc
                    .description
                    .unwrap_or_else(|| text::truncate(&doc.content, 200)),
                url: doc.url,
                author: doc.author,
                tags: doc.tags,
                publish_date: doc.publish_date,
                score: 0.0,
                highlights: HashMap::new(),
            })
            .collect::<Vec<_>>();
        Ok(SearchResults { total: hits.len() as i64, took_ms: 0, hits })
    }
}

fn parse_results(response: &Value) -> SearchResults {
    let total = response["hits"]["total"]["value"].as_i64().unwrap_or(0);
    let took_ms = response["took"].as_i64().unwrap_or(0);

    let empty = Vec::new();
    let hits = response["hits"]["hits"]
        .as_array()
        .unwrap_or(&empty)
        .iter()
        .map(|hit| {
            let source = &hit["_source"];
            let mut highlights = HashMap::new();
            if let Some(fields) = hit["highlight"].as_object() {
                for (field, fragments) in fields {
                    let fragments = fragments
                        .as_array()
                        .map(|a| {
                            a.iter()
                                .filter_map(|f| f.as_str().map(|s| s.to_string()))
                                .collect::<Vec<_>>()
                        })
                        .unwrap_or_default();
                    highlights.insert(field.clone(), fragments);
                }
            }
            SearchHit {
                url: source["url"].as_str().unwrap_or_default().to_string(),
                title: source["title"].as_str().unwrap_or("Untitled").to_string(),
                description: source["description"].as_str().unwrap_or_default().to_string(),
                author: source["author"].as_str().map(|s| s.to_string()),
                tags: source["tags"]
                    .as_array()
                    .map(|a| {
                        a.iter()
                            .filter_map(|t| t.as_str().map(|s| s.to_string()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default(),
                publish_date: source["publish_date"].as_str().map(|s| s.to_string()),
                score: hit["_score"].as_f64().unwrap_or(0.0),
                highlights,
            }
        })
        .collect();

    SearchResults { total, took_ms, hits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_shape() {
        let body = SearchEngine::build_query("rust crawler", &SearchFilters::default());
        assert_eq!(body["query"]["bool"]["must"][0]["multi_match"]["query"], "rust crawler");
        assert_eq!(
            body["query"]["bool"]["must"][0]["multi_match"]["fields"][0],
            "title^3"
        );
        assert_eq!(body["query"]["bool"]["filter"].as_array().unwrap().len(), 0);
        assert_eq!(body["sort"][0]["_score"]["order"], "desc");
    }

    #[test]
    fn test_build_query_filters() {
        let filters = SearchFilters {
            author: Some("Jane".to_string()),
            tags: vec!["rust".to_string()],
            date_from: Some("2024-01-01".to_string()),
            date_to: None,
        };
        let body = SearchEngine::build_query("q", &filters);
        let clauses = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0]["term"]["author"], "Jane");
        assert_eq!(clauses[1]["terms"]["tags"][0], "rust");
        assert_eq!(clauses[2]["range"]["publish_date"]["gte"], "2024-01-01");
    }

    #[test]
    fn test_parse_results() {
        let response = json!({
            "took": 12,
            "hits": {
                "total": { "value": 1 },
                "hits": [
                    {
                        "_score": 3.5,
                        "_source": {
                            "url": "https://example.com/article/a",
                            "title": "A title",
                            "description": "desc",
                            "tags": ["rust"],
                            "publish_date": "2024-01-01T00:00:00"
                        },
                        "highlight": { "content": ["...fragment..."] }
                    }
                ]
            }
        });
        let results = parse_results(&response);
        assert_eq!(results.total, 1);
        assert_eq!(results.took_ms, 12);
        assert_eq!(results.hits[0].score, 3.5);
        assert_eq!(results.hits[0].highlights["content"][0], "...fragment...");
    }

    #[tokio::test]
    async fn test_local_fallback_searches_store() {
        let store = ContentStore::in_memory().await.unwrap();
        let doc = pagesift_core::Document {
            url: "https://example.com/article/a".to_string(),
            title: Some("Ferret care basics".to_string()),
            description: None,
            content: "A long guide about ferrets and their habits.".to_string(),
            author: None,
            publish_date: None,
            tags: vec![],
            word_count: 8,
            reading_time: 1,
            readability_score: None,
            extracted_at: chrono::Utc::now(),
            content_hash: text::content_hash("A long guide about ferrets and their habits."),
        };
        assert!(store.save(&doc).await);

        let engine = SearchEngine::local_only(store, "web_content".to_string());
        let results = engine
            .search("ferret", &SearchFilters::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].title, "Ferret care basics");
        assert!(results.hits[0].description.contains("ferrets"));
    }
}
