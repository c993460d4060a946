//! Scraping the code table from an HTML reference page.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    errors::RegistryError,
    mapping::{CodeMapping, CodeRow},
    sources::MappingSource,
};

/// Default timeout for fetching the reference page.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));

/// Ways the reference page can fail to look like a code table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The document has no `<table>` element.
    #[error("no <table> element in document")]
    NoTable,

    /// A data row has fewer than the three expected cells.
    #[error("row {row} has {cells} cells, expected at least 3")]
    MalformedRow {
        /// 1-based index among data rows (the header is not counted).
        row: usize,
        /// Number of `<td>` cells found.
        cells: usize,
    },

    /// A data row has a blank legacy or alpha-2 cell.
    #[error("row {row} has an empty code")]
    EmptyCode {
        /// 1-based index among data rows (the header is not counted).
        row: usize,
    },

    /// The table has a header but no data rows.
    #[error("table has no data rows")]
    Empty,
}

/// Parses the first `<table>` of `html` into code rows.
///
/// The first `<tr>` is the header and is skipped. Every following row must
/// have at least three `<td>` cells (name, legacy code, alpha-2 code) and
/// both codes must be non-blank. Only the table's own rows and cells are
/// read; tables nested inside a cell are not.
pub fn parse_code_table(html: &str) -> Result<Vec<CodeRow>, TableError> {
    let doc = Html::parse_document(html);
    let table = doc.select(&TABLE).next().ok_or(TableError::NoTable)?;

    let mut rows = Vec::new();
    for (idx, tr) in own_rows(table).skip(1).enumerate() {
        let row = idx + 1;
        let cells: Vec<String> = child_elements(tr)
            .filter(|c| c.value().name() == "td")
            .map(cell_text)
            .collect();
        let [name, legacy, alpha2, ..] = cells.as_slice() else {
            warn!(row, cells = cells.len(), "malformed code table row");
            return Err(TableError::MalformedRow {
                row,
                cells: cells.len(),
            });
        };
        if legacy.is_empty() || alpha2.is_empty() {
            warn!(row, name = name.as_str(), "code table row with an empty code");
            return Err(TableError::EmptyCode { row });
        }
        rows.push(CodeRow::new(name.as_str(), legacy.as_str(), alpha2.as_str()));
    }

    if rows.is_empty() {
        return Err(TableError::Empty);
    }
    Ok(rows)
}

fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// `<tr>` children of `table` and of its `thead`/`tbody`/`tfoot` sections.
fn own_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    child_elements(table).flat_map(|child| match child.value().name() {
        "tr" => vec![child],
        "thead" | "tbody" | "tfoot" => child_elements(child)
            .filter(|c| c.value().name() == "tr")
            .collect(),
        _ => Vec::new(),
    })
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Scrapes the legacy ↔ alpha-2 table from a live reference page.
pub struct HtmlTableSource {
    client: Client,
}

impl HtmlTableSource {
    /// Creates a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RegistryError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Uses a pre-configured client (proxy settings, custom timeouts, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Downloads `url` and returns the raw table rows.
    pub async fn fetch_rows(&self, url: &str) -> Result<Vec<CodeRow>, RegistryError> {
        let started = Instant::now();
        info!(url, "fetching country code table");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::unavailable(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::unavailable(url, format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::unavailable(url, e.to_string()))?;
        let rows = parse_code_table(&body).map_err(|e| RegistryError::unavailable(url, e.to_string()))?;

        info!(
            url,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched country code table"
        );
        Ok(rows)
    }
}

#[async_trait]
impl MappingSource for HtmlTableSource {
    async fn fetch(&self, url: &str) -> Result<CodeMapping, RegistryError> {
        let rows = self.fetch_rows(url).await?;
        Ok(CodeMapping::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1>FIPS versus ISO 3166</h1>
          <table class="table">
            <thead><tr><th>Country</th><th>FIPS</th><th>ISO</th></tr></thead>
            <tbody>
              <tr><td>Japan</td><td> JA </td><td>JP</td></tr>
              <tr><td>Germany</td><td>GM</td><td>DE</td></tr>
              <tr><td>Iraq</td><td>IZ</td><td>IQ<br></td></tr>
            </tbody>
          </table>
          <table><tr><td>ignored</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn parses_first_table_skipping_header() {
        let rows = parse_code_table(PAGE).unwrap();
        assert_eq!(
            rows,
            vec![
                CodeRow::new("Japan", "JA", "JP"),
                CodeRow::new("Germany", "GM", "DE"),
                CodeRow::new("Iraq", "IZ", "IQ"),
            ]
        );
    }

    #[test]
    fn header_row_with_td_cells_is_still_skipped() {
        let html = "<table><tr><td>Country</td><td>FIPS</td><td>ISO</td></tr>\
                    <tr><td>Japan</td><td>JA</td><td>JP</td></tr></table>";
        let rows = parse_code_table(html).unwrap();
        assert_eq!(rows, vec![CodeRow::new("Japan", "JA", "JP")]);
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = parse_code_table("<html><body><p>moved</p></body></html>").unwrap_err();
        assert_eq!(err, TableError::NoTable);
    }

    #[test]
    fn short_row_is_reported_not_skipped() {
        let html = "<table><tr><th>a</th><th>b</th><th>c</th></tr>\
                    <tr><td>Japan</td><td>JA</td><td>JP</td></tr>\
                    <tr><td>Footnote</td></tr></table>";
        let err = parse_code_table(html).unwrap_err();
        assert_eq!(err, TableError::MalformedRow { row: 2, cells: 1 });
    }

    #[test]
    fn blank_code_cells_are_rejected() {
        let html = "<table><tr><th>a</th><th>b</th><th>c</th></tr>\
                    <tr><td>Japan</td><td>JA</td><td>JP</td></tr>\
                    <tr><td>Nowhere</td><td> </td><td>XX</td></tr></table>";
        assert_eq!(parse_code_table(html).unwrap_err(), TableError::EmptyCode { row: 2 });

        let html = "<table><tr><th>a</th><th>b</th><th>c</th></tr>\
                    <tr><td>Nowhere</td><td>NW</td><td></td></tr></table>";
        assert_eq!(parse_code_table(html).unwrap_err(), TableError::EmptyCode { row: 1 });
    }

    #[test]
    fn rows_of_nested_tables_are_not_read() {
        let html = "<table><tr><th>a</th><th>b</th><th>c</th></tr>\
                    <tr><td>Japan<table><tr><td>x</td><td>y</td><td>z</td></tr></table></td>\
                        <td>JA</td><td>JP</td></tr>\
                    <tr><td>Germany</td><td>GM</td><td>DE</td></tr></table>";
        let rows = parse_code_table(html).unwrap();
        let codes: Vec<_> = rows.iter().map(|r| (r.legacy.as_str(), r.alpha2.as_str())).collect();
        assert_eq!(codes, vec![("JA", "JP"), ("GM", "DE")]);
    }

    #[test]
    fn header_only_table_is_empty() {
        let html = "<table><tr><th>Country</th><th>FIPS</th><th>ISO</th></tr></table>";
        assert_eq!(parse_code_table(html).unwrap_err(), TableError::Empty);
    }
}
