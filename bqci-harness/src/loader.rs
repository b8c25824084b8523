//! Test case loading
//!
//! Resolves a file or a flat directory of SQL files into a [`TestSuite`]:
//! every file is split into statements, every statement is rewritten through
//! the translation map and named `<file stem>_<index>`.

use bqci_core::{DuplicatePolicy, HarnessConfig, HarnessError, TestCase, TranslationMap, DEFAULT_SQL_EXTENSION};
use bqci_sql::{split_statements, Template};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Extension of files picked up from a directory, compared case-insensitively.
    pub extension: String,
    pub on_duplicate: DuplicatePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_SQL_EXTENSION.to_string(),
            on_duplicate: DuplicatePolicy::default(),
        }
    }
}

impl From<&HarnessConfig> for LoadOptions {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            extension: config.sql_extension.clone(),
            on_duplicate: config.on_duplicate,
        }
    }
}

impl LoadOptions {
    fn matches(&self, path: &Path) -> bool {
        let wanted = self.extension.trim_start_matches('.');
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }
}

// ============================================================================
// TEST SUITE
// ============================================================================

/// Named, ready-to-run statements. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSuite {
    cases: BTreeMap<String, String>,
}

impl TestSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cases.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    /// Cases in name order.
    pub fn cases(&self) -> impl Iterator<Item = TestCase> + '_ {
        self.cases
            .iter()
            .map(|(name, query)| TestCase::new(name.clone(), query.clone()))
    }

    /// Add `case`, resolving a name clash according to `policy`.
    ///
    /// Returns the name the case was stored under.
    pub fn insert(
        &mut self,
        case: TestCase,
        policy: DuplicatePolicy,
        source: &Path,
    ) -> Result<String, HarnessError> {
        if !self.cases.contains_key(&case.name) {
            self.cases.insert(case.name.clone(), case.query);
            return Ok(case.name);
        }

        match policy {
            DuplicatePolicy::Overwrite => {
                tracing::warn!(
                    test = %case.name,
                    path = %source.display(),
                    "Duplicate test name, overwriting earlier test"
                );
                self.cases.insert(case.name.clone(), case.query);
                Ok(case.name)
            }
            DuplicatePolicy::Error => Err(HarnessError::DuplicateTestName {
                name: case.name,
                path: source.to_path_buf(),
            }),
            DuplicatePolicy::Disambiguate => {
                let name = (2..)
                    .map(|n| format!("{}__{}", case.name, n))
                    .find(|candidate| !self.cases.contains_key(candidate))
                    .unwrap_or_default();
                tracing::debug!(test = %case.name, renamed = %name, "Duplicate test name, renamed");
                self.cases.insert(name.clone(), case.query);
                Ok(name)
            }
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load a single SQL file or every matching file directly inside a directory.
///
/// # Errors
/// * `HarnessError::NotFound` - `path` does not exist
/// * `HarnessError::Io` - a directory listing or file read failed
/// * `HarnessError::DuplicateTestName` - a name clash under [`DuplicatePolicy::Error`]
pub fn load_tests(path: &Path, map: &TranslationMap, options: &LoadOptions) -> Result<TestSuite, HarnessError> {
    if !path.exists() {
        return Err(HarnessError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let files = if path.is_dir() {
        list_test_files(path, options)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut suite = TestSuite::new();
    for file in &files {
        for case in load_file(file, map)? {
            suite.insert(case, options.on_duplicate, file)?;
        }
    }

    tracing::debug!(path = %path.display(), files = files.len(), tests = suite.len(), "Loaded tests");
    Ok(suite)
}

/// Split and rewrite one file. A file without statements yields no cases.
pub fn load_file(path: &Path, map: &TranslationMap) -> Result<Vec<TestCase>, HarnessError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cases = split_statements(&text)
        .iter()
        .enumerate()
        .map(|(index, statement)| {
            let rewrite = Template::parse(statement).substitute_with_fallback(map);
            if !rewrite.fallbacks.is_empty() {
                tracing::debug!(
                    path = %path.display(),
                    index,
                    unmapped = ?rewrite.fallbacks,
                    "References left unchanged"
                );
            }
            TestCase::new(format!("{}_{}", stem, index), rewrite.text)
        })
        .collect();
    Ok(cases)
}

/// Regular files directly inside `dir` with the wanted extension, in name order.
fn list_test_files(dir: &Path, options: &LoadOptions) -> Result<Vec<PathBuf>, HarnessError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.is_file() && options.matches(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn io_error(path: &Path, err: std::io::Error) -> HarnessError {
    HarnessError::Io {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqci_test_utils::sql_dir;

    fn empty_map() -> TranslationMap {
        TranslationMap::new()
    }

    #[test]
    fn test_single_file_statement_names() {
        let dir = sql_dir(&[("file.sql", "SELECT 1; SELECT 2;")]);
        let suite = load_tests(&dir.path().join("file.sql"), &empty_map(), &LoadOptions::default()).unwrap();
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.get("file_0"), Some("SELECT 1;"));
        assert_eq!(suite.get("file_1"), Some("SELECT 2;"));
    }

    #[test]
    fn test_single_file_ignores_extension() {
        let dir = sql_dir(&[("check.txt", "SELECT 1;")]);
        let suite = load_tests(&dir.path().join("check.txt"), &empty_map(), &LoadOptions::default()).unwrap();
        assert_eq!(suite.names().collect::<Vec<_>>(), vec!["check_0"]);
    }

    #[test]
    fn test_directory_is_flat_and_filtered() {
        let dir = sql_dir(&[
            ("a.sql", "SELECT 1;"),
            ("b.SQL", "SELECT 2;"),
            ("notes.md", "SELECT 3;"),
            ("nested/c.sql", "SELECT 4;"),
        ]);
        let suite = load_tests(dir.path(), &empty_map(), &LoadOptions::default()).unwrap();
        assert_eq!(suite.names().collect::<Vec<_>>(), vec!["a_0", "b_0"]);
    }

    #[test]
    fn test_rewrites_each_statement() {
        let dir = sql_dir(&[("q.sql", "SELECT * FROM $ds.t1;\nSELECT * FROM $ds.t2;\n")]);
        let map = TranslationMap::from_pairs([("ds.t1", "ds.clone_t1")]);
        let suite = load_tests(dir.path(), &map, &LoadOptions::default()).unwrap();
        assert_eq!(suite.get("q_0"), Some("SELECT * FROM ds.clone_t1;"));
        assert_eq!(suite.get("q_1"), Some("SELECT * FROM ds.t2;"));
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = sql_dir(&[]);
        let missing = dir.path().join("nope");
        let err = load_tests(&missing, &empty_map(), &LoadOptions::default()).unwrap_err();
        assert_eq!(err, HarnessError::NotFound { path: missing });
    }

    #[test]
    fn test_empty_file_yields_no_cases() {
        let dir = sql_dir(&[("blank.sql", " ;\n\n;")]);
        let suite = load_tests(dir.path(), &empty_map(), &LoadOptions::default()).unwrap();
        assert!(suite.is_empty());
    }

    fn clashing_dir() -> tempfile::TempDir {
        // Both files have stem `a`; `a.SQL` sorts first.
        sql_dir(&[("a.SQL", "SELECT 'upper';"), ("a.sql", "SELECT 'lower';")])
    }

    #[test]
    fn test_duplicate_overwrite_keeps_later_file() {
        let dir = clashing_dir();
        let suite = load_tests(dir.path(), &empty_map(), &LoadOptions::default()).unwrap();
        assert_eq!(suite.len(), 1);
        assert_eq!(suite.get("a_0"), Some("SELECT 'lower';"));
    }

    #[test]
    fn test_duplicate_error() {
        let dir = clashing_dir();
        let options = LoadOptions {
            on_duplicate: DuplicatePolicy::Error,
            ..LoadOptions::default()
        };
        let err = load_tests(dir.path(), &empty_map(), &options).unwrap_err();
        assert!(matches!(err, HarnessError::DuplicateTestName { ref name, .. } if name == "a_0"));
    }

    #[test]
    fn test_duplicate_disambiguate() {
        let dir = clashing_dir();
        let options = LoadOptions {
            on_duplicate: DuplicatePolicy::Disambiguate,
            ..LoadOptions::default()
        };
        let suite = load_tests(dir.path(), &empty_map(), &options).unwrap();
        assert_eq!(suite.get("a_0"), Some("SELECT 'upper';"));
        assert_eq!(suite.get("a_0__2"), Some("SELECT 'lower';"));
    }

    #[test]
    fn test_custom_extension() {
        let dir = sql_dir(&[("a.sql", "SELECT 1;"), ("b.bq", "SELECT 2;")]);
        let options = LoadOptions {
            extension: ".bq".to_string(),
            ..LoadOptions::default()
        };
        let suite = load_tests(dir.path(), &empty_map(), &options).unwrap();
        assert_eq!(suite.names().collect::<Vec<_>>(), vec!["b_0"]);
    }
}
