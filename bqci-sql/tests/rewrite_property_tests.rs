//! Property tests for reference rewriting and statement splitting.
//!
//! Tests verify:
//! - Fallback substitution terminates within unresolved + 1 passes
//! - Rewritten text contains no markers
//! - Rewriting is idempotent on its own output
//! - Split statements re-join to the original, modulo whitespace

use bqci_core::TranslationMap;
use bqci_sql::{rewrite, split_statements, Template};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// GENERATORS
// ============================================================================

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}(\\.[a-z][a-z0-9_]{0,6}){0,2}"
}

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("SELECT".to_string()),
        Just("*".to_string()),
        Just("FROM".to_string()),
        Just("WHERE x = 1".to_string()),
        Just("'quoted text'".to_string()),
        "[a-z]{1,8}",
    ]
}

#[derive(Debug, Clone)]
enum Piece {
    Word(String),
    Marker(String),
}

fn pieces() -> impl Strategy<Value = Vec<Piece>> {
    prop::collection::vec(
        prop_oneof![
            word().prop_map(Piece::Word),
            ident().prop_map(Piece::Marker),
        ],
        0..16,
    )
}

fn render(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| match p {
            Piece::Word(w) => w.clone(),
            Piece::Marker(k) => format!("${}", k),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn translation_map() -> impl Strategy<Value = TranslationMap> {
    prop::collection::btree_map(ident(), ident().prop_map(|v| format!("dev.clone_{}", v)), 0..6)
        .prop_map(|m: BTreeMap<String, String>| TranslationMap::from_pairs(m))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_fallback_terminates_within_bound(pieces in pieces(), map in translation_map()) {
        let text = render(&pieces);
        let template = Template::parse(&text);
        let unresolved = template.unresolved(&map).len();

        let result = template.substitute_with_fallback(&map);
        prop_assert!(result.passes <= unresolved + 1);
        prop_assert_eq!(result.fallbacks.len(), unresolved);
    }

    #[test]
    fn prop_rewritten_text_has_no_markers(pieces in pieces(), map in translation_map()) {
        let text = render(&pieces);
        let out = rewrite(&text, &map);
        prop_assert!(Template::parse(&out).keys().is_empty());
        prop_assert!(!out.contains('$'));
    }

    #[test]
    fn prop_rewrite_is_idempotent(pieces in pieces(), map in translation_map()) {
        let once = rewrite(&render(&pieces), &map);
        let twice = rewrite(&once, &map);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_mapped_markers_take_mapped_value(key in ident(), value in ident()) {
        let map = TranslationMap::from_pairs([(key.clone(), value.clone())]);
        let out = rewrite(&format!("SELECT * FROM ${} WHERE 1 = 1", key), &map);
        prop_assert_eq!(out, format!("SELECT * FROM {} WHERE 1 = 1", value));
    }

    #[test]
    fn prop_split_then_join_round_trips(
        statements in prop::collection::vec("[A-Za-z0-9 ,*=()']{0,20}", 0..8),
        padding in prop::collection::vec("[ \t\n]{0,3}", 8),
    ) {
        let text = statements
            .iter()
            .zip(padding.iter().cycle())
            .map(|(s, pad)| format!("{}{};", pad, s))
            .collect::<String>();

        let split = split_statements(&text);
        prop_assert!(split.iter().all(|s| s.ends_with(';') && s.trim() != ";"));

        let expected: Vec<String> = statements
            .iter()
            .map(|s| normalize(s))
            .filter(|s| !s.is_empty())
            .map(|s| format!("{};", s))
            .collect();
        prop_assert_eq!(normalize(&split.join(" ")), normalize(&expected.join(" ")));
    }
}

#[test]
fn scenario_dataset_qualified_reference() {
    let map = TranslationMap::from_pairs([("ds.t1", "ds.clone_t1")]);
    assert_eq!(rewrite("SELECT * FROM $ds.t1", &map), "SELECT * FROM ds.clone_t1");
}
