use serde_json::{json, Value};

/// Mapping for the content index: exact fields for identity and
/// filtering, analyzed fields for full-text queries.
pub fn content_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "url": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "analyzer": "standard",
                    "fields": {
                        "keyword": { "type": "keyword", "ignore_above": 256 }
                    }
                },
                "content": { "type": "text", "analyzer": "standard" },
                "description": { "type": "text", "analyzer": "standard" },
                "author": { "type": "keyword" },
                "tags": { "type": "keyword" },
                "keywords": { "type": "keyword" },
                "publish_date": {
                    "type": "date",
                    "format": "strict_date_optional_time||epoch_millis"
                },
                "indexed_at": {
                    "type": "date",
                    "format": "strict_date_optional_time||epoch_millis"
                },
                "word_count": { "type": "integer" },
                "reading_time": { "type": "integer" },
                "readability_score": { "type": "float" },
                "domain": { "type": "keyword" },
                "content_hash": { "type": "keyword" }
            }
        },
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        }
    })
}
