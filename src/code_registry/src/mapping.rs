//! The legacy ↔ alpha-2 lookup built from one pass over a code table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One row of a code table: `(name, legacy, alpha2)`.
///
/// `name` is informational; only `legacy` and `alpha2` feed the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeRow {
    /// Country name as printed in the source table (may be empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Legacy (FIPS 10-4) code.
    pub legacy: String,
    /// ISO 3166-1 alpha-2 code.
    pub alpha2: String,
}

impl CodeRow {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, legacy: impl Into<String>, alpha2: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legacy: legacy.into(),
            alpha2: alpha2.into(),
        }
    }
}

/// Bidirectional legacy ↔ alpha-2 lookup.
///
/// Both directions are filled in the same pass. When a key repeats, the later
/// row wins (the key keeps its first insertion position).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeMapping {
    legacy_to_alpha2: IndexMap<String, String>,
    alpha2_to_legacy: IndexMap<String, String>,
}

impl CodeMapping {
    /// Builds a mapping from `(legacy, alpha2)` pairs.
    pub fn from_pairs<I, L, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, A)>,
        L: Into<String>,
        A: Into<String>,
    {
        let mut mapping = Self::default();
        for (legacy, alpha2) in pairs {
            let (legacy, alpha2) = (legacy.into(), alpha2.into());
            mapping.alpha2_to_legacy.insert(alpha2.clone(), legacy.clone());
            mapping.legacy_to_alpha2.insert(legacy, alpha2);
        }
        mapping
    }

    /// Builds a mapping from table rows, ignoring the name column.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a CodeRow>,
    {
        Self::from_pairs(rows.into_iter().map(|r| (r.legacy.as_str(), r.alpha2.as_str())))
    }

    /// Legacy → alpha-2.
    pub fn alpha2_for(&self, legacy: &str) -> Option<&str> {
        self.legacy_to_alpha2.get(legacy).map(String::as_str)
    }

    /// Alpha-2 → legacy.
    pub fn legacy_for(&self, alpha2: &str) -> Option<&str> {
        self.alpha2_to_legacy.get(alpha2).map(String::as_str)
    }

    /// Number of distinct legacy codes.
    pub fn len(&self) -> usize {
        self.legacy_to_alpha2.len()
    }

    /// True if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.legacy_to_alpha2.is_empty()
    }

    /// Iterates `(legacy, alpha2)` in first-seen order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.legacy_to_alpha2
            .iter()
            .map(|(l, a)| (l.as_str(), a.as_str()))
    }
}
