//! Wide (one column per year) → long (one row per country-year) reshaping.

use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::{
    Deserialize, Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;

use crate::errors::{Error, ReshapeError};

/// Identifier column of the World Bank indicator tables.
pub const DEFAULT_ID_COLUMN: &str = "Country Code";

/// Descriptor columns that carry no per-year values.
const DESCRIPTOR_COLUMNS: [&str; 3] = ["Country Name", "Indicator Name", "Indicator Code"];

/// A table with one identifier column and one value column per year.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Name of the identifier column.
    pub id_column: String,
    /// Year column headers, in column order.
    pub years: Vec<String>,
    /// Data rows.
    pub rows: Vec<WideRow>,
}

/// One row of a [`WideTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    /// Value of the identifier column.
    pub country_code: String,
    /// One value per year column; `None` for a missing value.
    pub values: Vec<Option<f64>>,
}

impl WideTable {
    /// Empty table with the default identifier column.
    pub fn new<S: Into<String>>(years: impl IntoIterator<Item = S>) -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            years: years.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, checking it has one value per year column.
    pub fn push_row(
        &mut self,
        country_code: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), ReshapeError> {
        let country_code = country_code.into();
        if values.len() != self.years.len() {
            return Err(ReshapeError::RaggedRow {
                row: self.rows.len(),
                country: country_code,
                found: values.len(),
                expected: self.years.len(),
            });
        }
        self.rows.push(WideRow {
            country_code,
            values,
        });
        Ok(())
    }

    /// Reads a column-oriented JSON object:
    /// `{"Country Code": ["ABC", ...], "2000": [2, ...], ...}`.
    ///
    /// The World Bank descriptor columns and blank `Unnamed: N` columns are
    /// ignored; every other column must be a 4-digit year. Cells may be
    /// numbers, `null`, blank strings, or numeric strings.
    pub fn from_columns_json(json: &str) -> Result<Self, Error> {
        let columns: IndexMap<String, Vec<Value>> = serde_json::from_str(json)?;
        Ok(Self::from_columns(columns)?)
    }

    fn from_columns(mut columns: IndexMap<String, Vec<Value>>) -> Result<Self, ReshapeError> {
        let ids = columns
            .shift_remove(DEFAULT_ID_COLUMN)
            .ok_or_else(|| ReshapeError::MissingIdColumn(DEFAULT_ID_COLUMN.to_string()))?;

        let mut years = Vec::new();
        let mut value_columns = Vec::new();
        for (header, cells) in columns {
            let trimmed = header.trim();
            if DESCRIPTOR_COLUMNS.contains(&trimmed) || trimmed.starts_with("Unnamed") {
                continue;
            }
            parse_year(trimmed)?;
            if cells.len() != ids.len() {
                return Err(ReshapeError::ColumnLength {
                    column: trimmed.to_string(),
                    found: cells.len(),
                    expected: ids.len(),
                });
            }
            let parsed = cells
                .iter()
                .enumerate()
                .map(|(row, v)| parse_cell(trimmed, row, v))
                .collect::<Result<Vec<_>, _>>()?;
            years.push(trimmed.to_string());
            value_columns.push(parsed);
        }

        let mut table = Self::new(years);
        for (row, id) in ids.iter().enumerate() {
            let country_code = match id {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            let values = value_columns.iter().map(|col| col[row]).collect();
            table.push_row(country_code, values)?;
        }
        Ok(table)
    }
}

fn parse_cell(column: &str, row: usize, value: &Value) -> Result<Option<f64>, ReshapeError> {
    let invalid = || ReshapeError::InvalidValue {
        column: column.to_string(),
        row,
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Parses a 4-digit year header into January 1 of that year.
pub fn parse_year(header: &str) -> Result<NaiveDate, ReshapeError> {
    let invalid = || ReshapeError::InvalidYearColumn(header.to_string());
    if header.len() != 4 || !header.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = header.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)
}

/// One value of one metric for one country and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    /// Country code (alpha-3 for the World Bank tables).
    pub country_code: String,
    /// January 1 of the year.
    pub year: NaiveDate,
    /// The metric value, `None` if missing in the source.
    pub value: Option<f64>,
}

impl TimeSeriesRecord {
    /// Calendar year.
    pub fn year_number(&self) -> i32 {
        self.year.year()
    }
}

/// Long-form rows of a single named metric.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    /// Metric name, e.g. `Immigrants` or `Populations`.
    pub value_name: String,
    /// Rows in melt order.
    pub rows: Vec<TimeSeriesRecord>,
}

impl LongTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Serializes as `[{"Country Code": .., "Year": .., "<value_name>": ..}, ..]`.
impl Serialize for LongTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Row<'a>(&'a str, &'a TimeSeriesRecord);

        impl Serialize for Row<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry(DEFAULT_ID_COLUMN, &self.1.country_code)?;
                map.serialize_entry("Year", &self.1.year)?;
                map.serialize_entry(self.0, &self.1.value)?;
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for r in &self.rows {
            seq.serialize_element(&Row(&self.value_name, r))?;
        }
        seq.end()
    }
}

/// Melts a wide per-year table into long form.
///
/// Rows come out year-column-major: every country for the first year, then
/// every country for the next year, each block in input row order. Duplicate
/// country rows are not collapsed.
pub fn melt(table: &WideTable, value_name: &str) -> Result<LongTable, ReshapeError> {
    let years = table
        .years
        .iter()
        .map(|h| parse_year(h))
        .collect::<Result<Vec<_>, _>>()?;

    for (idx, row) in table.rows.iter().enumerate() {
        if row.values.len() != years.len() {
            return Err(ReshapeError::RaggedRow {
                row: idx,
                country: row.country_code.clone(),
                found: row.values.len(),
                expected: years.len(),
            });
        }
    }

    let mut rows = Vec::with_capacity(years.len() * table.rows.len());
    for (col, year) in years.iter().enumerate() {
        for row in &table.rows {
            rows.push(TimeSeriesRecord {
                country_code: row.country_code.clone(),
                year: *year,
                value: row.values[col],
            });
        }
    }

    Ok(LongTable {
        value_name: value_name.to_string(),
        rows,
    })
}
