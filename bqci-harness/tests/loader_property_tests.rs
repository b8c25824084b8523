use bqci_core::TranslationMap;
use bqci_harness::{load_tests, LoadOptions};
use bqci_test_utils::generators::{file_stem, statement_body};
use bqci_test_utils::sql_dir;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn files() -> impl Strategy<Value = BTreeMap<String, Vec<String>>> {
    prop::collection::btree_map(file_stem(), prop::collection::vec(statement_body(), 0..5), 0..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn names_are_stem_and_statement_index(files in files()) {
        let contents: Vec<(String, String)> = files
            .iter()
            .map(|(stem, statements)| {
                let body = statements.iter().map(|s| format!("{};\n", s)).collect::<String>();
                (format!("{}.sql", stem), body)
            })
            .collect();
        let borrowed: Vec<(&str, &str)> = contents
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
            .collect();
        let dir = sql_dir(&borrowed);

        let suite = load_tests(dir.path(), &TranslationMap::new(), &LoadOptions::default()).unwrap();

        let expected: BTreeSet<String> = files
            .iter()
            .flat_map(|(stem, statements)| (0..statements.len()).map(move |i| format!("{}_{}", stem, i)))
            .collect();
        let actual: BTreeSet<String> = suite.names().map(str::to_string).collect();
        prop_assert_eq!(actual, expected);

        for case in suite.cases() {
            prop_assert!(!case.query.contains('$'));
            prop_assert!(case.query.ends_with(';'));
        }
    }
}
