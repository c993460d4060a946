//! Keyed join of the immigration and population series.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reshape::{LongTable, TimeSeriesRecord};

/// How rows without a counterpart on the population side are treated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Keep only keys present on both sides.
    #[default]
    Inner,
    /// Keep every immigrant row; a missing population is `None`.
    Left,
}

/// One country-year with both metrics and the derived rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    /// ISO alpha-3 code.
    #[serde(rename = "Alpha3Code")]
    pub country_code: String,
    /// January 1 of the year.
    #[serde(rename = "Year")]
    pub year: NaiveDate,
    /// Immigrant stock.
    #[serde(rename = "Immigrants")]
    pub immigrants: Option<f64>,
    /// Total population.
    #[serde(rename = "Populations")]
    pub population: Option<f64>,
    /// `immigrants / population * 100`. NaN or infinite when undefined;
    /// serializes as `null` in that case.
    #[serde(rename = "Rate(%)")]
    pub rate: f64,
}

impl JoinedRecord {
    fn new(country_code: String, year: NaiveDate, immigrants: Option<f64>, population: Option<f64>) -> Self {
        Self {
            rate: rate(immigrants, population),
            country_code,
            year,
            immigrants,
            population,
        }
    }

    /// Calendar year.
    pub fn year_number(&self) -> i32 {
        self.year.year()
    }
}

/// `immigrants / population * 100`; NaN when either side is missing.
pub fn rate(immigrants: Option<f64>, population: Option<f64>) -> f64 {
    match (immigrants, population) {
        (Some(i), Some(p)) => i / p * 100.0,
        _ => f64::NAN,
    }
}

/// Rows dropped or padded by a join.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    /// Immigrant rows with no population row for their key.
    pub unmatched_immigrants: usize,
    /// Population rows with no immigrant row for their key.
    pub unmatched_population: usize,
}

/// Inner join on `(country_code, year)`.
pub fn join_series(immigrants: &LongTable, population: &LongTable) -> Vec<JoinedRecord> {
    join_series_with(immigrants, population, JoinPolicy::Inner).0
}

/// Joins on `(country_code, year)` under `policy`.
///
/// Output follows the immigrant rows' order. A key repeated on the population
/// side yields one output row per match.
pub fn join_series_with(
    immigrants: &LongTable,
    population: &LongTable,
    policy: JoinPolicy,
) -> (Vec<JoinedRecord>, JoinReport) {
    let mut by_key: HashMap<(&str, NaiveDate), Vec<&TimeSeriesRecord>> = HashMap::new();
    for p in &population.rows {
        by_key.entry((p.country_code.as_str(), p.year)).or_default().push(p);
    }

    let mut report = JoinReport::default();
    let mut out = Vec::with_capacity(immigrants.rows.len());
    for i in &immigrants.rows {
        match by_key.get(&(i.country_code.as_str(), i.year)) {
            Some(matches) => out.extend(matches.iter().map(|p| {
                JoinedRecord::new(i.country_code.clone(), i.year, i.value, p.value)
            })),
            None => {
                report.unmatched_immigrants += 1;
                if policy == JoinPolicy::Left {
                    out.push(JoinedRecord::new(i.country_code.clone(), i.year, i.value, None));
                }
            }
        }
    }

    let immigrant_keys: HashSet<_> = immigrants
        .rows
        .iter()
        .map(|i| (i.country_code.as_str(), i.year))
        .collect();
    report.unmatched_population = population
        .rows
        .iter()
        .filter(|p| !immigrant_keys.contains(&(p.country_code.as_str(), p.year)))
        .count();

    debug!(
        ?policy,
        joined = out.len(),
        unmatched_immigrants = report.unmatched_immigrants,
        unmatched_population = report.unmatched_population,
        "joined immigrant and population series"
    );
    (out, report)
}
