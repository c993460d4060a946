//! The versioned, checked-in code table.
//!
//! The bundled table lives in `data/fips_iso.toml` and is compiled into the
//! crate, so resolving legacy codes does not depend on a third-party page
//! staying up or keeping its markup. `country-join registry refresh`
//! regenerates it from the live page (see [`crate::refresh`]).

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::RegistryError,
    mapping::{CodeMapping, CodeRow},
    sources::MappingSource,
};

const BUNDLED: &str = include_str!("../../data/fips_iso.toml");

/// A code table as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticTable {
    /// Free-form version tag, usually the date the table was captured.
    pub version: String,
    /// Page the table was captured from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Table rows in source order.
    #[serde(rename = "entry", default)]
    pub entries: Vec<CodeRow>,
}

impl StaticTable {
    /// The table compiled into this crate.
    pub fn bundled() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUNDLED)
    }

    /// Parses and validates a table from TOML.
    ///
    /// Codes are trimmed; an entry with an empty legacy or alpha-2 code after
    /// trimming is rejected.
    pub fn from_toml_str(s: &str) -> Result<Self, RegistryError> {
        let mut table: StaticTable =
            toml::from_str(s).map_err(|e| RegistryError::StaticTable(e.to_string()))?;

        for entry in table.entries.iter_mut() {
            entry.name = entry.name.trim().to_string();
            entry.legacy = entry.legacy.trim().to_string();
            entry.alpha2 = entry.alpha2.trim().to_string();
        }
        table.validate()?;
        Ok(table)
    }

    /// Checks the table has entries and none of them has a blank code.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.legacy.trim().is_empty() || e.alpha2.trim().is_empty())
        {
            return Err(RegistryError::StaticTable(format!(
                "entry {} has an empty code",
                idx + 1
            )));
        }
        if self.entries.is_empty() {
            return Err(RegistryError::StaticTable("table has no entries".into()));
        }
        Ok(())
    }

    /// Reads a table file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serializes the table back to TOML (`[[entry]]` array of tables).
    pub fn to_toml_string(&self) -> Result<String, RegistryError> {
        Ok(toml::to_string(self)?)
    }

    /// Builds the lookup for this table.
    pub fn to_mapping(&self) -> CodeMapping {
        CodeMapping::from_rows(&self.entries)
    }
}

/// Serves a [`StaticTable`] for any URL.
pub struct StaticTableSource {
    table: StaticTable,
    mapping: CodeMapping,
}

impl StaticTableSource {
    /// Wraps a table, building its lookup once.
    pub fn new(table: StaticTable) -> Self {
        let mapping = table.to_mapping();
        Self { table, mapping }
    }

    /// Source backed by the bundled table.
    pub fn bundled() -> Result<Self, RegistryError> {
        Ok(Self::new(StaticTable::bundled()?))
    }

    /// The underlying table.
    pub fn table(&self) -> &StaticTable {
        &self.table
    }
}

#[async_trait]
impl MappingSource for StaticTableSource {
    async fn fetch(&self, url: &str) -> Result<CodeMapping, RegistryError> {
        debug!(url, version = %self.table.version, "serving static code table");
        Ok(self.mapping.clone())
    }
}
