//! Table-reference templates.
//!
//! Authored SQL prefixes the tables it wants redirected with `$`:
//!
//! ```text
//! SELECT * FROM $sales.orders JOIN ${sales.customers}_v USING (id)
//! ```
//!
//! A marker is `$` followed by identifier characters (ASCII letters, digits,
//! `_` and `.`), or the braced form `${...}`. Dots belong to the identifier, so
//! `$sales.orders` is one key. Trailing dots of an unbraced marker are not part
//! of it. A `$` that does not start a valid marker is ordinary text.
//!
//! Markers whose key is not in the translation map resolve to the key itself,
//! so a query naming an unprovisioned table still runs against production.

use bqci_core::TranslationMap;
use std::collections::BTreeSet;
use std::fmt;

/// Character that introduces a table-reference marker.
pub const MARKER_PREFIX: char = '$';

// ============================================================================
// SEGMENTS
// ============================================================================

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Marker(&'a str),
}

/// A marker key that a strict substitution could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey(pub String);

impl fmt::Display for MissingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no translation for key {}", self.0)
    }
}

impl std::error::Error for MissingKey {}

/// Output of [`Template::substitute_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Number of substitution attempts; always `fallbacks.len() + 1`.
    pub passes: usize,
    /// Keys that were absent from the map and kept their own name, sorted.
    pub fallbacks: Vec<String>,
}

// ============================================================================
// TEMPLATE
// ============================================================================

/// Parsed SQL text with its markers located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    source: &'a str,
    segments: Vec<Segment<'a>>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Try to read a marker whose `$` sits at byte offset `dollar`.
/// Returns the key and the byte offset just past the marker.
fn scan_marker(source: &str, dollar: usize) -> Option<(&str, usize)> {
    let rest = &source[dollar + MARKER_PREFIX.len_utf8()..];

    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let key = &braced[..close];
        if key.is_empty() || !key.chars().all(is_ident_char) {
            return None;
        }
        // `$` + `{` + key + `}`
        return Some((key, dollar + 2 + close + 1));
    }

    let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    let key = rest[..len].trim_end_matches('.');
    if key.is_empty() || key.starts_with('.') {
        return None;
    }
    Some((key, dollar + 1 + key.len()))
}

impl<'a> Template<'a> {
    /// Split `source` into literal text and markers.
    pub fn parse(source: &'a str) -> Self {
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;

        while let Some(offset) = source[pos..].find(MARKER_PREFIX) {
            let dollar = pos + offset;
            match scan_marker(source, dollar) {
                Some((key, end)) => {
                    if literal_start < dollar {
                        segments.push(Segment::Literal(&source[literal_start..dollar]));
                    }
                    segments.push(Segment::Marker(key));
                    literal_start = end;
                    pos = end;
                }
                None => pos = dollar + MARKER_PREFIX.len_utf8(),
            }
        }
        if literal_start < source.len() {
            segments.push(Segment::Literal(&source[literal_start..]));
        }

        Self { source, segments }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Distinct marker keys, sorted.
    pub fn keys(&self) -> BTreeSet<&'a str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Marker(key) => Some(*key),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Distinct marker keys absent from `map`, sorted.
    pub fn unresolved(&self, map: &TranslationMap) -> BTreeSet<&'a str> {
        self.keys()
            .into_iter()
            .filter(|key| !map.contains(key))
            .collect()
    }

    /// Strict substitution: fails on the first key missing from `map`.
    pub fn substitute(&self, map: &TranslationMap) -> Result<String, MissingKey> {
        self.render(map, &BTreeSet::new())
            .map_err(|key| MissingKey(key.to_string()))
    }

    /// Substitution that never fails.
    ///
    /// Runs the strict substitution; each time it stops on a missing key, that
    /// key is added to a local identity overlay (`key -> key`) and the attempt
    /// is repeated. Every retry resolves one more distinct key, so this takes
    /// at most `unresolved(map).len() + 1` passes.
    pub fn substitute_with_fallback(&self, map: &TranslationMap) -> Rewrite {
        let mut identity: BTreeSet<&'a str> = BTreeSet::new();
        let mut passes = 0;

        loop {
            passes += 1;
            match self.render(map, &identity) {
                Ok(text) => {
                    return Rewrite {
                        text,
                        passes,
                        fallbacks: identity.into_iter().map(str::to_string).collect(),
                    }
                }
                Err(key) => {
                    identity.insert(key);
                }
            }
        }
    }

    fn render(&self, map: &TranslationMap, identity: &BTreeSet<&'a str>) -> Result<String, &'a str> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match *segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Marker(key) => match map.get(key) {
                    Some(physical) => out.push_str(physical),
                    None if identity.contains(key) => out.push_str(key),
                    None => return Err(key),
                },
            }
        }
        Ok(out)
    }
}

/// Rewrite every marker in `text` using `map`, falling back to the key itself.
pub fn rewrite(text: &str, map: &TranslationMap) -> String {
    Template::parse(text).substitute_with_fallback(map).text
}
