//! Keyword generation for array-contains search.
//!
//! Firestore has no native text search. Instead, every searchable field of a
//! record is expanded into a set of tokens (whole-text prefixes, words, word
//! prefixes and contiguous word phrases) stored in the record's `keywords`
//! array, and a search becomes a single "array contains" lookup.

use super::text::normalize;
use std::collections::BTreeSet;

/// Number of leading characters of the whole text that get prefix tokens.
pub const PHRASE_PREFIX_LIMIT: usize = 15;

/// A deduplicated set of search tokens, kept in a stable order.
pub type KeywordSet = BTreeSet<String>;

/// Build the keyword set for one text field.
///
/// # Example
///
/// ```
/// use customer_registry_mcp::search::generate_keywords;
///
/// let keywords = generate_keywords("João Maria");
/// assert!(keywords.contains("joao maria"));
/// assert!(keywords.contains("mar"));
/// assert!(keywords.contains("j"));
/// assert!(!keywords.contains("m"));
/// ```
pub fn generate_keywords(text: &str) -> KeywordSet {
    let cleaned = normalize(text);

    // Guard the initial-letter lookup below.
    let Some(initial) = cleaned.chars().next() else {
        return KeywordSet::new();
    };

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let mut keywords = KeywordSet::new();

    keywords.extend(char_prefixes(&cleaned, PHRASE_PREFIX_LIMIT));

    for word in &words {
        keywords.insert((*word).to_string());
        keywords.extend(char_prefixes(word, usize::MAX));
    }

    for start in 0..words.len() {
        for end in start..words.len() {
            keywords.insert(words[start..=end].join(" "));
        }
    }

    keywords.retain(|token| token.chars().count() != 1);
    keywords.insert(initial.to_string());

    keywords
}

/// Build the keyword set for an optional field; absent fields index nothing.
pub fn generate_field_keywords(text: Option<&str>) -> KeywordSet {
    text.map(generate_keywords).unwrap_or_default()
}

/// Every prefix of `text` of length 1 up to `limit` characters.
fn char_prefixes(text: &str, limit: usize) -> impl Iterator<Item = String> + '_ {
    text.char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .take(limit)
        .map(move |end| text[..end].to_string())
}
