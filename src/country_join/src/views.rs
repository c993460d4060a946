//! Read-side projections used by the dashboard: per-year slices, trends,
//! rankings and tone/rate scatter points.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::join::JoinedRecord;
use crate::models::{ArticleAggregate, Enriched};

/// Last year with published indicator data.
pub const LATEST_INDICATOR_YEAR: i32 = 2023;

/// Year of indicator data to show next to articles from `date`.
pub fn indicator_year(date: NaiveDate, latest: i32) -> i32 {
    date.year().min(latest)
}

/// Joined rows for one calendar year.
pub fn rows_for_year(rows: &[JoinedRecord], year: i32) -> Vec<&JoinedRecord> {
    rows.iter().filter(|r| r.year_number() == year).collect()
}

/// Sorted, de-duplicated alpha-3 codes present in `rows`.
pub fn country_list(rows: &[JoinedRecord]) -> Vec<String> {
    rows.iter()
        .map(|r| r.country_code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows for `countries` between `start_year` and `end_year` inclusive,
/// ordered by country then year.
pub fn trend<'a, S: AsRef<str>>(
    rows: &'a [JoinedRecord],
    countries: &[S],
    start_year: i32,
    end_year: i32,
) -> Vec<&'a JoinedRecord> {
    let wanted: HashSet<&str> = countries.iter().map(AsRef::as_ref).collect();
    let mut out: Vec<_> = rows
        .iter()
        .filter(|r| wanted.contains(r.country_code.as_str()))
        .filter(|r| (start_year..=end_year).contains(&r.year_number()))
        .collect();
    out.sort_by(|a, b| (&a.country_code, a.year).cmp(&(&b.country_code, b.year)));
    out
}

/// One line of a rank table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    /// 1-based position, highest value first.
    #[serde(rename = "Rank")]
    pub rank: usize,
    /// Alpha-3 code.
    #[serde(rename = "Alpha3Code")]
    pub country: String,
    /// The ranked value.
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Ranks `rows` by `metric`, highest first.
///
/// Rows without a key or with a missing or non-finite value are left out.
/// Ties keep input order.
pub fn rank_by<T, F>(rows: &[T], metric: F) -> Vec<RankEntry>
where
    F: Fn(&T) -> Option<(&str, f64)>,
{
    let mut kept: Vec<(&str, f64)> = rows
        .iter()
        .filter_map(&metric)
        .filter(|(_, v)| v.is_finite())
        .collect();
    kept.sort_by(|a, b| b.1.total_cmp(&a.1));
    kept.into_iter()
        .enumerate()
        .map(|(i, (country, value))| RankEntry {
            rank: i + 1,
            country: country.to_string(),
            value,
        })
        .collect()
}

/// Rank table of immigration rates.
pub fn rank_rates(rows: &[JoinedRecord]) -> Vec<RankEntry> {
    rank_by(rows, |r| Some((r.country_code.as_str(), r.rate)))
}

/// Rank table of mean article tone.
pub fn rank_tones(rows: &[Enriched<ArticleAggregate>]) -> Vec<RankEntry> {
    rank_by(rows, |r| Some((r.alpha3.as_deref()?, r.row.tone?)))
}

/// Tone against immigration rate for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    /// Alpha-3 code.
    #[serde(rename = "Alpha3Code")]
    pub country: String,
    /// Mean article tone.
    #[serde(rename = "Tone")]
    pub tone: f64,
    /// Immigration rate in percent.
    #[serde(rename = "Rate(%)")]
    pub rate: f64,
}

/// Inner join of tone rows and one year's joined rows on alpha-3.
pub fn scatter_points(
    tone_rows: &[Enriched<ArticleAggregate>],
    year_rows: &[&JoinedRecord],
) -> Vec<ScatterPoint> {
    let rates: HashMap<&str, f64> = year_rows
        .iter()
        .map(|r| (r.country_code.as_str(), r.rate))
        .collect();
    tone_rows
        .iter()
        .filter_map(|t| {
            let country = t.alpha3.as_deref()?;
            let rate = *rates.get(country)?;
            Some(ScatterPoint {
                country: country.to_string(),
                tone: t.row.tone?,
                rate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jr(code: &str, year: i32, rate: f64) -> JoinedRecord {
        JoinedRecord {
            country_code: code.into(),
            year: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            immigrants: None,
            population: None,
            rate,
        }
    }

    fn tone(alpha3: Option<&str>, tone: Option<f64>) -> Enriched<ArticleAggregate> {
        Enriched {
            row: ArticleAggregate {
                country_code: String::new(),
                count: None,
                tone,
            },
            alpha3: alpha3.map(str::to_string),
        }
    }

    #[test]
    fn indicator_year_is_clamped() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(indicator_year(d, LATEST_INDICATOR_YEAR), 2023);
        let d = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        assert_eq!(indicator_year(d, LATEST_INDICATOR_YEAR), 2019);
    }

    #[test]
    fn rank_excludes_non_finite_rates() {
        let rows = vec![
            jr("USA", 2020, 10.0),
            jr("CAN", 2020, f64::INFINITY),
            jr("DEU", 2020, 15.0),
            jr("FRA", 2020, f64::NAN),
        ];
        let ranked = rank_rates(&rows);
        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].rank, ranked[0].country.as_str()), (1, "DEU"));
        assert_eq!((ranked[1].rank, ranked[1].country.as_str()), (2, "USA"));
    }

    #[test]
    fn tone_rank_skips_rows_without_alpha3_or_tone() {
        let rows = vec![
            tone(Some("USA"), Some(-2.0)),
            tone(None, Some(5.0)),
            tone(Some("DEU"), None),
            tone(Some("JPN"), Some(1.0)),
        ];
        let ranked = rank_tones(&rows);
        let order: Vec<_> = ranked.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["JPN", "USA"]);
    }

    #[test]
    fn slices_and_trends() {
        let rows = vec![
            jr("USA", 2021, 1.0),
            jr("DEU", 2020, 2.0),
            jr("USA", 2020, 3.0),
            jr("FRA", 2020, 4.0),
        ];
        assert_eq!(rows_for_year(&rows, 2020).len(), 3);
        assert_eq!(country_list(&rows), vec!["DEU", "FRA", "USA"]);

        let t = trend(&rows, &["USA", "DEU"], 2020, 2021);
        let keys: Vec<_> = t.iter().map(|r| (r.country_code.as_str(), r.year_number())).collect();
        assert_eq!(keys, vec![("DEU", 2020), ("USA", 2020), ("USA", 2021)]);
        assert!(trend(&rows, &["USA"], 2022, 2023).is_empty());
    }

    #[test]
    fn scatter_is_an_inner_join_on_alpha3() {
        let rows = vec![jr("USA", 2023, 14.0), jr("DEU", 2023, 19.0)];
        let year = rows_for_year(&rows, 2023);
        let tones = vec![tone(Some("USA"), Some(-1.0)), tone(Some("JPN"), Some(0.5))];
        let points = scatter_points(&tones, &year);
        assert_eq!(
            points,
            vec![ScatterPoint {
                country: "USA".into(),
                tone: -1.0,
                rate: 14.0,
            }]
        );
    }
}
