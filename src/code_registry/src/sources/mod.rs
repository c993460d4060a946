//! Mapping sources.
//!
//! A [`MappingSource`] turns a source URL into a [`CodeMapping`]. Two
//! implementations ship with the crate:
//!
//! - [`html_table::HtmlTableSource`] downloads a reference page and reads its
//!   first `<table>` (column 1 legacy, column 2 alpha-2, one header row).
//! - [`static_table::StaticTableSource`] serves the versioned table compiled
//!   into the crate (or a table loaded from disk) and never touches the network.
//!
//! The trait is object safe so the registry can pick a source at runtime via
//! [`build_source`].

pub mod html_table;
pub mod static_table;

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    errors::RegistryError,
    mapping::CodeMapping,
    sources::{html_table::HtmlTableSource, static_table::{StaticTable, StaticTableSource}},
};

/// Something that can produce a [`CodeMapping`] for a source URL.
#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Fetches and parses the mapping published at `url`.
    ///
    /// Any failure to obtain a well-formed table is reported as
    /// [`RegistryError::SourceUnavailable`].
    async fn fetch(&self, url: &str) -> Result<CodeMapping, RegistryError>;
}

/// Which source implementation to use (serde snake_case).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The checked-in table; no network access.
    #[default]
    Static,
    /// Scrape the live HTML page.
    Http,
}

/// Knobs shared by [`build_source`].
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Timeout for the whole HTTP exchange.
    pub fetch_timeout: Duration,
    /// Custom static table to use instead of the bundled one.
    pub static_table: Option<PathBuf>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: html_table::DEFAULT_TIMEOUT,
            static_table: None,
        }
    }
}

/// Build and return a boxed mapping source for the supplied kind.
pub fn build_source(
    kind: SourceKind,
    opts: &SourceOptions,
) -> Result<Box<dyn MappingSource>, RegistryError> {
    match kind {
        SourceKind::Static => {
            let table = match &opts.static_table {
                Some(path) => StaticTable::from_path(path)?,
                None => StaticTable::bundled()?,
            };
            Ok(Box::new(StaticTableSource::new(table)))
        }
        SourceKind::Http => Ok(Box::new(HtmlTableSource::new(opts.fetch_timeout)?)),
    }
}
