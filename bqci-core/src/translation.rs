//! Translation map: logical table reference -> provisioned table identifier.
//!
//! Stored on disk as a flat JSON object. The provisioner writes it, the
//! harness reads it; during a harness run it is never mutated.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Mapping from logical table reference to physical identifier.
///
/// Keys are kept sorted so the serialized file is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMap {
    entries: BTreeMap<String, String>,
}

impl TranslationMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(logical, physical)` pairs. Later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn contains(&self, logical: &str) -> bool {
        self.entries.contains_key(logical)
    }

    /// Insert an entry, returning the previous physical identifier if any.
    pub fn insert(&mut self, logical: impl Into<String>, physical: impl Into<String>) -> Option<String> {
        self.entries.insert(logical.into(), physical.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Load a translation file. A missing or malformed file is a config error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let map: TranslationMap =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), entries = map.len(), "Loaded translation map");
        Ok(map)
    }

    /// Load a translation file if a path was given, otherwise start empty.
    pub fn load_or_empty(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::new()),
        }
    }

    /// Write the map as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_flat_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.json");
        std::fs::write(
            &path,
            r#"{"ds.t1": "proj.dev.clone_20220101000000_t1", "proj.ds.t1": "proj.dev.clone_20220101000000_t1"}"#,
        )
        .unwrap();

        let map = TranslationMap::load(&path).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("ds.t1"), Some("proj.dev.clone_20220101000000_t1"));
        assert!(map.get("ds.t2").is_none());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TranslationMap::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_load_rejects_non_string_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"ds.t1": 3}"#).unwrap();
        let err = TranslationMap::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_load_or_empty_without_path() {
        let map = TranslationMap::load_or_empty(None).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_save_writes_sorted_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let map = TranslationMap::from_pairs([("z.t", "p.d.clone_z"), ("a.t", "p.d.clone_a")]);
        map.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"a.t\": \"p.d.clone_a\",\n  \"z.t\": \"p.d.clone_z\"\n}"
        );
        assert_eq!(TranslationMap::load(&path).unwrap(), map);
    }
}
