//! Selector heuristics. These are an ordered fallback chain: the
//! first qualifying rule wins, and the order is load-bearing.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    r#"[role="main"]"#,
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
    ".article-body",
];

const TITLE_SELECTORS: &[&str] = &[
    "h1",
    ".title",
    ".post-title",
    ".article-title",
    ".entry-title",
    r#"[property="og:title"]"#,
];

const AUTHOR_SELECTORS: &[&str] = &[
    r#"[rel="author"]"#,
    ".author",
    ".byline",
    r#"[property="article:author"]"#,
    ".post-author",
];

const DATE_SELECTORS: &[&str] = &[
    r#"[property="article:published_time"]"#,
    "[datetime]",
    ".date",
    ".publish-date",
    "time",
];

const TAG_SELECTORS: &[&str] = &[".tags a", ".categories a", ".tag", r#"[property="article:tag"]"#];

/// Subtrees that are page chrome, not content.
const SKIP_ELEMENTS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Class-attribute markers for ads and social widgets.
const AD_CLASS_MARKERS: &[&str] = &["ad", "advertisement", "social-share", "related-posts"];

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

fn is_chrome(element: &scraper::node::Element) -> bool {
    if SKIP_ELEMENTS.contains(&element.name()) {
        return true;
    }
    if let Some(class) = element.attr("class") {
        let class = class.to_lowercase();
        if AD_CLASS_MARKERS.iter().any(|marker| class.contains(marker)) {
            return true;
        }
    }
    false
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => {
                out.push_str(&t.text);
                out.push(' ');
            }
            Node::Element(e) => {
                // comments fall through the match; chrome subtrees are
                // pruned wholesale
                if !is_chrome(e) {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        push_text(child_element, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Visible text of an element with chrome subtrees and comments
/// removed, whitespace-normalized.
fn clean_element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_match<'a>(dom: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    dom.select(&sel).next()
}

fn first_text(dom: &Html, selectors: &[&str]) -> Option<String> {
    for css in selectors {
        if let Some(element) = first_match(dom, css) {
            let text = clean_element_text(element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Body selection, in order: content-container selectors (> 200 chars),
/// concatenated long paragraphs, then the whole `<body>` (> 200 chars).
pub(crate) fn select_body(dom: &Html) -> Option<String> {
    for css in CONTENT_SELECTORS {
        if let Some(element) = first_match(dom, css) {
            let text = clean_element_text(element);
            if text.len() > 200 {
                return Some(text);
            }
        }
    }

    if let Some(sel) = selector("p") {
        let blocks: Vec<String> = dom
            .select(&sel)
            .map(clean_element_text)
            .filter(|text| text.len() > 50)
            .collect();
        if !blocks.is_empty() {
            return Some(blocks.join(" "));
        }
    }

    let body = first_match(dom, "body")?;
    let text = clean_element_text(body);
    if text.len() > 200 {
        return Some(text);
    }
    None
}

pub(crate) fn extract_title(dom: &Html) -> Option<String> {
    if let Some(title) = first_text(dom, TITLE_SELECTORS) {
        return Some(title);
    }
    let element = first_match(dom, "title")?;
    let text = clean_element_text(element);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn extract_description(dom: &Html) -> Option<String> {
    for css in [r#"meta[name="description"]"#, r#"meta[property="og:description"]"#] {
        if let Some(element) = first_match(dom, css) {
            if let Some(content) = element.value().attr("content") {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
    }
    None
}

pub(crate) fn extract_author(dom: &Html) -> Option<String> {
    first_text(dom, AUTHOR_SELECTORS)
}

/// First selector that yields a date string wins; if that string does
/// not parse, the date is absent rather than trying weaker selectors.
pub(crate) fn extract_publish_date(dom: &Html) -> Option<String> {
    for css in DATE_SELECTORS {
        let Some(element) = first_match(dom, css) else {
            continue;
        };
        let raw = element
            .value()
            .attr("datetime")
            .or_else(|| element.value().attr("content"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| clean_element_text(element));
        if !raw.is_empty() {
            return parse_date(&raw);
        }
    }
    None
}

/// Normalize a date string to ISO-8601, accepting the formats pages
/// actually use.
pub(crate) fn parse_date(raw: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return Some(dt.to_rfc3339());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
    }
    for fmt in ["%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y"] {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, fmt) {
            return Some(format!("{}T00:00:00", date.format("%Y-%m-%d")));
        }
    }
    None
}

/// Union of tag-ish elements in selector order, first occurrence wins,
/// capped at 10.
pub(crate) fn extract_tags(dom: &Html) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for css in TAG_SELECTORS {
        let Some(sel) = selector(css) else { continue };
        for element in dom.select(&sel) {
            let tag = clean_element_text(element);
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags.truncate(10);
    tags
}

pub(crate) fn collect_links(dom: &Html, base_url: &Url) -> Vec<Url> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };

    dom.select(&sel)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
                || href.starts_with("data:")
                || href.starts_with('#')
            {
                return None;
            }
            base_url.join(href).ok()
        })
        .collect()
}
