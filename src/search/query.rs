//! Caller-side search term handling.

use super::keywords::KeywordSet;
use super::text::normalize;
use std::fmt;

/// A normalized search box value, matched as a single literal token.
///
/// Because the indexer stores word prefixes, whole words and contiguous
/// phrases, a term hits any record whose indexed text has the term as a
/// prefix of a word, a word, or a phrase fragment. Arbitrary substrings
/// (e.g. `"aria"` for `"Maria"`) do not match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Normalize raw user input into a search term.
    ///
    /// Returns `None` when the input normalizes to the empty string, in
    /// which case no keyword filter should be applied.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = normalize(raw);
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The token to look up in the stored keyword array.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether a stored keyword set contains this term.
    pub fn matches(&self, keywords: &KeywordSet) -> bool {
        keywords.contains(&self.0)
    }

    /// Same check against a stored keyword array.
    pub fn matches_slice(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| k == &self.0)
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
