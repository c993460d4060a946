//! Registry errors.

use thiserror::Error;

/// Errors raised while obtaining a country-code mapping.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The mapping could not be fetched or the page did not contain the
    /// expected table. Fatal to anything that depends on the mapping.
    #[error("mapping data unavailable from {url}: {reason}")]
    SourceUnavailable {
        /// Source URL the mapping was requested for.
        url: String,
        /// Human-readable cause (transport error, HTTP status, table shape).
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// A static code table failed to parse or validate.
    #[error("invalid static code table: {0}")]
    StaticTable(String),

    /// A generic I/O error (reading or writing a static table).
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// A static table could not be serialized to TOML.
    #[error("failed to serialize code table: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl RegistryError {
    pub(crate) fn unavailable(url: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// True for [`RegistryError::SourceUnavailable`].
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}
