//! Country-code registry: legacy (FIPS 10-4) ↔ ISO 3166-1 alpha-2 mappings.
//!
//! A [`CodeRegistry`] owns a [`MappingSource`] (a live HTML table or the
//! checked-in static table) and a [`MappingCache`] keyed by source URL.
//! Callers ask for a mapping with [`CodeRegistry::fetch_mapping`] and get an
//! immutable, shared [`CodeMapping`] back.

#![deny(missing_docs)]

pub mod cache;
pub mod errors;
pub mod mapping;
pub mod refresh;
pub mod registry;
pub mod sources;

pub use cache::MappingCache;
pub use errors::RegistryError;
pub use mapping::{CodeMapping, CodeRow};
pub use registry::CodeRegistry;
pub use sources::{
    MappingSource, SourceKind, SourceOptions, build_source,
    html_table::{HtmlTableSource, TableError, parse_code_table},
    static_table::{StaticTable, StaticTableSource},
};
