//! Heuristic article extraction: a pure function from (URL, HTML) to a
//! structured [`Document`], or nothing when the page has no body worth
//! keeping. Malformed HTML never fails: the parser is lenient and
//! every heuristic degrades to "absent".

mod content;
mod readability;

use chrono::Utc;
use scraper::Html;
use url::Url;

use pagesift_core::{text, Document};

pub use readability::flesch_reading_ease;

/// Run the extraction chain against a page. Returns None when no body
/// candidate qualifies.
pub fn extract(url: &Url, html: &str) -> Option<Document> {
    let dom = Html::parse_document(html);

    let body = content::select_body(&dom)?;
    let title = content::extract_title(&dom);
    let description = content::extract_description(&dom);
    let author = content::extract_author(&dom);
    let publish_date = content::extract_publish_date(&dom);
    let tags = content::extract_tags(&dom);

    let word_count = body.split_whitespace().count() as u32;
    let reading_time = text::reading_time(word_count);
    let readability_score = readability::flesch_reading_ease(&body);
    let content_hash = text::content_hash(&body);

    Some(Document {
        url: url.as_str().to_string(),
        title,
        description,
        content: body,
        author,
        publish_date,
        tags,
        word_count,
        reading_time,
        readability_score,
        extracted_at: Utc::now(),
        content_hash,
    })
}

/// Resolve every `<a href>` on the page against its base URL.
/// Non-navigational schemes and bare fragments are skipped; the crawl
/// loop applies its own filter rules on top.
pub fn extract_links(base_url: &Url, html: &str) -> Vec<Url> {
    let dom = Html::parse_document(html);
    content::collect_links(&dom, base_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/article/base").unwrap()
    }

    fn article_html(body: &str) -> String {
        format!(
            "<html><head><title>Fallback Title</title></head>\
             <body><article>{}</article></body></html>",
            body
        )
    }

    fn long_paragraph() -> String {
        "The quick brown fox jumps over the lazy dog near the riverbank. ".repeat(6)
    }

    #[test]
    fn test_extract_returns_document_for_article() {
        let html = article_html(&long_paragraph());
        let doc = extract(&base(), &html).expect("article should qualify");
        assert!(doc.content.len() > 200);
        assert!(doc.word_count >= 1);
        assert!(doc.reading_time >= 1);
        assert_eq!(doc.content_hash.len(), 32);
        assert_eq!(doc.title.as_deref(), Some("Fallback Title"));
    }

    #[test]
    fn test_extract_is_total_on_garbage() {
        assert!(extract(&base(), "").is_none());
        assert!(extract(&base(), "<div><p>short</p>").is_none());
        assert!(extract(&base(), "<script>var x = 1;</script>").is_none());
        assert!(extract(&base(), "<<<>>>&&& not html at all").is_none());
    }

    #[test]
    fn test_extract_skips_chrome_and_ads() {
        let html = format!(
            "<body>\
             <nav>Navigation links everywhere</nav>\
             <header>Site header</header>\
             <article>\
               <div class=\"advertisement\">BUY NOW BUY NOW</div>\
               {}\
             </article>\
             <footer>Footer text</footer>\
             </body>",
            long_paragraph()
        );
        let doc = extract(&base(), &html).unwrap();
        assert!(!doc.content.contains("BUY NOW"));
        assert!(!doc.content.contains("Navigation"));
        assert!(!doc.content.contains("Footer"));
    }

    #[test]
    fn test_selector_chain_prefers_article_over_paragraphs() {
        let html = format!(
            "<body><article>{}</article><p>{}</p></body>",
            long_paragraph(),
            "Unrelated paragraph that is long enough to qualify on its own merits here."
        );
        let doc = extract(&base(), &html).unwrap();
        assert!(!doc.content.contains("Unrelated paragraph"));
    }

    #[test]
    fn test_paragraph_fallback_when_no_container_matches() {
        let para = "This paragraph carries enough prose to clear the fifty character bar easily.";
        let html = format!("<body><div><p>{}</p><p>tiny</p></div></body>", para);
        let doc = extract(&base(), &html).unwrap();
        assert_eq!(doc.content, para);
    }

    #[test]
    fn test_metadata_extraction() {
        let html = format!(
            "<html><head>\
             <meta name=\"description\" content=\"A page about foxes\">\
             <meta property=\"article:published_time\" content=\"2024-03-01T10:00:00+00:00\">\
             </head><body>\
             <h1>Fox Journal</h1>\
             <span class=\"author\">Jane Doe</span>\
             <div class=\"tags\"><a>animals</a><a>foxes</a><a>animals</a></div>\
             <article>{}</article>\
             </body></html>",
            long_paragraph()
        );
        let doc = extract(&base(), &html).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Fox Journal"));
        assert_eq!(doc.description.as_deref(), Some("A page about foxes"));
        assert_eq!(doc.author.as_deref(), Some("Jane Doe"));
        assert_eq!(doc.publish_date.as_deref(), Some("2024-03-01T10:00:00+00:00"));
        assert_eq!(doc.tags, vec!["animals".to_string(), "foxes".to_string()]);
    }

    #[test]
    fn test_meta_only_title_falls_through_to_title_tag() {
        // og:title is matched by text, and a meta element has none, so
        // the chain lands on <title>; only the publish-date heuristic
        // reads attributes
        let html = format!(
            "<html><head>\
             <title>Document Title</title>\
             <meta property=\"og:title\" content=\"Social Title\">\
             </head><body><article>{}</article></body></html>",
            long_paragraph()
        );
        let doc = extract(&base(), &html).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Document Title"));
    }

    #[test]
    fn test_tags_capped_at_ten() {
        let tag_links: String =
            (0..15).map(|i| format!("<a>tag-{}</a>", i)).collect();
        let html = format!(
            "<body><div class=\"tags\">{}</div><article>{}</article></body>",
            tag_links,
            long_paragraph()
        );
        let doc = extract(&base(), &html).unwrap();
        assert_eq!(doc.tags.len(), 10);
    }

    #[test]
    fn test_identical_bodies_share_a_fingerprint() {
        let body = long_paragraph();
        let a = extract(&Url::parse("https://a.example.com/article/1").unwrap(), &article_html(&body)).unwrap();
        let b = extract(&Url::parse("https://b.example.com/article/2").unwrap(), &article_html(&body)).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.url, b.url);
    }

    #[test]
    fn test_extract_links_resolves_and_skips_schemes() {
        let html = "<body>\
            <a href=\"/blog/post-1\">relative</a>\
            <a href=\"https://other.com/news/2\">absolute</a>\
            <a href=\"javascript:void(0)\">js</a>\
            <a href=\"mailto:a@b.c\">mail</a>\
            <a href=\"#section\">anchor</a>\
            </body>";
        let links = extract_links(&base(), html);
        let as_strings: Vec<String> = links.iter().map(|u| u.to_string()).collect();
        assert_eq!(
            as_strings,
            vec![
                "https://example.com/blog/post-1".to_string(),
                "https://other.com/news/2".to_string(),
            ]
        );
    }
}
