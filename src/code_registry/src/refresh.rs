//! Regenerates a static code table from the live reference page.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::{
    errors::RegistryError,
    sources::{html_table::HtmlTableSource, static_table::StaticTable},
};

/// Fetches `url` once and writes its table to `out` as TOML.
///
/// The written table is versioned with today's UTC date and records `url`
/// as its source. Nothing is written if the fetch or parse fails, or if the
/// result would not load back as a valid static table.
pub async fn refresh_static_table(
    source: &HtmlTableSource,
    url: &str,
    out: &Path,
) -> Result<StaticTable, RegistryError> {
    let entries = source.fetch_rows(url).await?;
    let table = StaticTable {
        version: Utc::now().format("%Y-%m-%d").to_string(),
        source_url: Some(url.to_string()),
        entries,
    };
    table.validate()?;

    let body = format!(
        "# Legacy (FIPS 10-4) to ISO 3166-1 alpha-2 country codes.\n\
         # Regenerate with `country-join registry refresh`.\n{}",
        table.to_toml_string()?
    );
    std::fs::write(out, body)?;
    info!(url, path = %out.display(), entries = table.entries.len(), "wrote static code table");
    Ok(table)
}
