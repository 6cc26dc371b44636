//! Syndication feeds over the content store: RSS 2.0 and JSON Feed
//! 1.1, whole-store or filtered to a topic.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

use pagesift_core::config::FeedConfig;
use pagesift_core::Document;
use pagesift_storage::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Json,
}

pub struct FeedGenerator {
    store: ContentStore,
    title: String,
    description: String,
    max_items: usize,
}

impl FeedGenerator {
    pub fn new(store: ContentStore, config: &FeedConfig) -> Self {
        Self {
            store,
            title: config.title.clone(),
            description: config.description.clone(),
            max_items: config.max_items,
        }
    }

    pub async fn generate(&self, topic: Option<&str>, format: FeedFormat) -> Result<String> {
        let items = match topic {
            Some(topic) => self.store.get_by_topic(topic, self.max_items as i64).await?,
            None => self.store.get_recent(self.max_items as i64).await?,
        };
        let title = match topic {
            Some(topic) => format!("{}: {}", self.title, topic),
            None => self.title.clone(),
        };
        Ok(match format {
            FeedFormat::Rss => self.render_rss(&title, &items),
            FeedFormat::Json => self.render_json(&title, &items),
        })
    }

    fn render_rss(&self, title: &str, items: &[Document]) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<rss version=\"2.0\">\n  <channel>\n");
        out.push_str(&format!("    <title>{}</title>\n", xml_escape(title)));
        out.push_str(&format!(
            "    <description>{}</description>\n",
            xml_escape(&self.description)
        ));
        out.push_str("    <link>https://example.com</link>\n");
        out.push_str(&format!(
            "    <lastBuildDate>{}</lastBuildDate>\n",
            rss_date(&Utc::now())
        ));

        for item in items {
            out.push_str("    <item>\n");
            out.push_str(&format!(
                "      <title>{}</title>\n",
                xml_escape(item.title.as_deref().unwrap_or("Untitled"))
            ));
            out.push_str(&format!(
                "      <description>{}</description>\n",
                xml_escape(item.description.as_deref().unwrap_or(""))
            ));
            out.push_str(&format!("      <link>{}</link>\n", xml_escape(&item.url)));
            out.push_str(&format!("      <guid>{}</guid>\n", xml_escape(&item.url)));
            if let Some(date) = item.publish_date.as_deref().and_then(parse_publish_date) {
                out.push_str(&format!("      <pubDate>{}</pubDate>\n", rss_date(&date)));
            }
            if let Some(author) = &item.author {
                out.push_str(&format!("      <author>{}</author>\n", xml_escape(author)));
            }
            for tag in &item.tags {
                out.push_str(&format!("      <category>{}</category>\n", xml_escape(tag)));
            }
            out.push_str("    </item>\n");
        }

        out.push_str("  </channel>\n</rss>\n");
        out
    }

    fn render_json(&self, title: &str, items: &[Document]) -> String {
        let feed_items: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                let mut value = json!({
                    "id": item.url,
                    "url": item.url,
                    "title": item.title.as_deref().unwrap_or("Untitled"),
                    "content_text": item.content,
                    "summary": item.description.as_deref().unwrap_or(""),
                    "date_published": item.publish_date,
                    "tags": item.tags,
                });
                if let Some(author) = &item.author {
                    value["authors"] = json!([{ "name": author }]);
                }
                value
            })
            .collect();

        let feed = json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": title,
            "description": self.description,
            "home_page_url": "https://example.com",
            "feed_url": "https://example.com/feed.json",
            "items": feed_items,
        });

        serde_json::to_string_pretty(&feed).unwrap_or_else(|_| "{}".to_string())
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rss_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Publish dates are our own ISO-8601 output: RFC 3339 or a naive
/// `%Y-%m-%dT%H:%M:%S`.
fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesift_core::text;

    fn doc(url: &str, title: &str, tags: &[&str]) -> Document {
        Document {
            url: url.to_string(),
            title: Some(title.to_string()),
            description: Some("Summary & more".to_string()),
            content: "Body text".to_string(),
            author: Some("Jane Doe".to_string()),
            publish_date: Some("2024-03-01T10:00:00+00:00".to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            word_count: 2,
            reading_time: 1,
            readability_score: None,
            extracted_at: Utc::now(),
            content_hash: text::content_hash(url),
        }
    }

    async fn seeded_generator() -> FeedGenerator {
        let store = ContentStore::in_memory().await.unwrap();
        store.save(&doc("https://example.com/article/a", "First <Post>", &["rust"])).await;
        FeedGenerator::new(store, &FeedConfig::default())
    }

    #[tokio::test]
    async fn test_rss_feed_structure() {
        let feed = seeded_generator().await.generate(None, FeedFormat::Rss).await.unwrap();
        assert!(feed.starts_with("<?xml"));
        assert!(feed.contains("<rss version=\"2.0\">"));
        assert!(feed.contains("<title>Pagesift Feed</title>"));
        // escaped title, not raw markup
        assert!(feed.contains("First &lt;Post&gt;"));
        assert!(feed.contains("<guid>https://example.com/article/a</guid>"));
        assert!(feed.contains("<pubDate>Fri, 01 Mar 2024 10:00:00 GMT</pubDate>"));
        assert!(feed.contains("<category>rust</category>"));
        assert!(feed.contains("Summary &amp; more"));
    }

    #[tokio::test]
    async fn test_json_feed_structure() {
        let feed = seeded_generator().await.generate(None, FeedFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&feed).unwrap();
        assert_eq!(value["version"], "https://jsonfeed.org/version/1.1");
        assert_eq!(value["items"][0]["id"], "https://example.com/article/a");
        assert_eq!(value["items"][0]["authors"][0]["name"], "Jane Doe");
        assert_eq!(value["items"][0]["tags"][0], "rust");
    }

    #[tokio::test]
    async fn test_topic_feed_filters_and_titles() {
        let store = ContentStore::in_memory().await.unwrap();
        store.save(&doc("https://example.com/article/a", "Rusty", &["rust"])).await;
        store.save(&doc("https://example.com/article/b", "Ferrets", &["pets"])).await;
        let generator = FeedGenerator::new(store, &FeedConfig::default());

        let feed = generator.generate(Some("pets"), FeedFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&feed).unwrap();
        assert_eq!(value["title"], "Pagesift Feed: pets");
        assert_eq!(value["items"].as_array().unwrap().len(), 1);
        assert_eq!(value["items"][0]["title"], "Ferrets");
    }
}
