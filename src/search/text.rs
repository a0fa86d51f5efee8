//! Text normalization shared by the keyword indexer and the search box.
//!
//! Both sides of a keyword lookup must agree on the canonical form of a
//! string, so every comparison goes through [`normalize`].

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Convert arbitrary text into its canonical comparable form.
///
/// The text is trimmed, decomposed (NFD) with combining marks removed,
/// lowercased, and stripped of every character that is neither an ASCII
/// letter/digit nor whitespace. The result is trimmed again so that
/// stripping a leading or trailing symbol never leaves dangling whitespace.
///
/// # Example
///
/// ```
/// use customer_registry_mcp::search::normalize;
///
/// assert_eq!(normalize("  João, da Silva! "), "joao da silva");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect();

    stripped.trim().to_string()
}

/// Word characters kept by [`normalize`].
fn is_word_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}
