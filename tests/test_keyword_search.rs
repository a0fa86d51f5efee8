//! Property and scenario tests for keyword generation and search terms.

use customer_registry_mcp::search::{generate_keywords, normalize, SearchTerm};
use proptest::prelude::*;

#[test]
fn test_multi_word_name() {
    let keywords = generate_keywords("João Maria");

    for token in ["j", "jo", "joao", "joao m", "joao maria", "mar", "maria"] {
        assert!(keywords.contains(token), "missing {token}");
    }
    assert!(!keywords.contains("m"));
    assert!(!keywords.contains("aria"));
}

#[test]
fn test_normalize_strips_accents_and_punctuation() {
    assert_eq!(normalize("  JOSÉ da Silva! "), "jose da silva");
    assert_eq!(normalize("123.456.789-01"), "12345678901");
    assert_eq!(normalize("ÇÃO"), "cao");
}

#[test]
fn test_search_term_matches_accented_input() {
    let keywords = generate_keywords("Conceição");
    assert!(SearchTerm::parse("CONCEI").unwrap().matches(&keywords));
    assert!(SearchTerm::parse("conceiçao").unwrap().matches(&keywords));
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,40}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalized_text_is_trimmed_lowercase_ascii(text in "\\PC{0,40}") {
        let cleaned = normalize(&text);
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        prop_assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric() || c.is_whitespace()));
        prop_assert!(cleaned.chars().all(|c| !c.is_uppercase()));
    }

    #[test]
    fn only_the_initial_is_a_single_char_token(text in "[A-Za-zÀ-ÿ ]{1,30}") {
        let keywords = generate_keywords(&text);
        let singles: Vec<&String> = keywords.iter().filter(|t| t.chars().count() == 1).collect();
        prop_assert!(singles.len() <= 1);
        if let Some(initial) = normalize(&text).chars().next() {
            let expected = initial.to_string();
            prop_assert_eq!(singles, vec![&expected]);
        }
    }

    #[test]
    fn every_word_prefix_is_searchable(words in prop::collection::vec("[a-z]{2,8}", 1..4)) {
        let text = words.join(" ");
        let keywords = generate_keywords(&text);
        for word in &words {
            for end in 2..=word.len() {
                let term = SearchTerm::parse(&word[..end]).unwrap();
                prop_assert!(term.matches(&keywords), "{} not found for {}", &word[..end], text);
            }
        }
        let whole = SearchTerm::parse(&text).unwrap();
        prop_assert!(whole.matches(&keywords));
    }
}
