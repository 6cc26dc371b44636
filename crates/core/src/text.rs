//! Text normalization and analysis shared by the extractor and the
//! indexing bridge.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static NON_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:()\-"]"#).expect("non-text pattern"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("word pattern"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "up",
    "about", "into", "through", "during", "before", "after", "above", "below", "between", "among",
    "this", "that", "these", "those", "i", "me", "my", "myself", "we", "our", "ours", "ourselves",
    "you", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
    "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves",
    "what", "which", "who", "whom", "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "will", "would",
    "should", "could", "can", "may", "might", "must", "shall",
];

/// Collapse whitespace and strip characters outside the basic
/// word/punctuation set.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = WHITESPACE.replace_all(text, " ");
    NON_TEXT.replace_all(&collapsed, "").trim().to_string()
}

/// The content fingerprint: MD5 of the cleaned, lowercased text. This
/// is the one definition used for store uniqueness and index ids.
pub fn content_hash(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let normalized = clean_text(content).to_lowercase();
    format!("{:x}", md5::compute(normalized.as_bytes()))
}

/// Frequency-ranked keywords with an English stop-word filter. Ties
/// break alphabetically so the ranking is deterministic.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut freq: HashMap<String, usize> = HashMap::new();
    for m in WORD.find_iter(&text.to_lowercase()) {
        let word = m.as_str();
        if word.len() > 3 && !STOP_WORDS.contains(&word) {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(max_keywords).map(|(word, _)| word).collect()
}

/// Estimated reading time in minutes at ~200 wpm, floored at 1.
pub fn reading_time(word_count: u32) -> u32 {
    (word_count / 200).max(1)
}

/// Truncate at a word boundary, appending `...` when shortened.
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }
    let mut cut = max_length;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let truncated = &text[..cut];
    let truncated = match truncated.rfind(' ') {
        Some(pos) if pos > 0 => &truncated[..pos],
        _ => truncated,
    };
    format!("{}...", truncated)
}
