//! Keyword indexing and search-term normalization.
//!
//! Records store a `keywords` array computed at write time; searches
//! normalize the user's input and look it up with a single
//! "array contains" filter.

pub mod keywords;
pub mod query;
pub mod text;

pub use keywords::{generate_field_keywords, generate_keywords, KeywordSet, PHRASE_PREFIX_LIMIT};
pub use query::SearchTerm;
pub use text::normalize;
