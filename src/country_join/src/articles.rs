//! Article filtering and per-country aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ArticleAggregate, ArticleRecord};

/// Default keyword selecting immigration coverage.
pub const DEFAULT_KEYWORD: &str = "immigra";

/// Keeps articles whose contextual text contains `keyword`, ignoring case.
/// Articles without contextual text never match.
pub fn filter_by_keyword(articles: Vec<ArticleRecord>, keyword: &str) -> Vec<ArticleRecord> {
    let needle = keyword.to_lowercase();
    articles
        .into_iter()
        .filter(|a| {
            a.contextual_text
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Keeps articles published on `date` (UTC calendar day).
pub fn filter_by_date(articles: Vec<ArticleRecord>, date: NaiveDate) -> Vec<ArticleRecord> {
    articles
        .into_iter()
        .filter(|a| a.date_time.date_naive() == date)
        .collect()
}

/// Article count and mean tone per country code, sorted by code.
pub fn aggregate_by_country(articles: &[ArticleRecord]) -> Vec<ArticleAggregate> {
    let mut acc: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for a in articles {
        let e = acc.entry(a.country_code.as_str()).or_insert((0, 0.0));
        e.0 += 1;
        e.1 += a.doc_tone;
    }
    acc.into_iter()
        .map(|(code, (count, sum))| ArticleAggregate {
            country_code: code.to_string(),
            count: Some(count),
            tone: Some(sum / count as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(code: &str, day: u32, text: Option<&str>, tone: f64) -> ArticleRecord {
        ArticleRecord {
            date_time: Utc.with_ymd_and_hms(2023, 3, day, 12, 0, 0).unwrap(),
            country_code: code.into(),
            title: String::new(),
            contextual_text: text.map(str::to_string),
            doc_tone: tone,
            url: None,
        }
    }

    #[test]
    fn keyword_match_ignores_case_and_missing_text() {
        let rows = vec![
            article("US", 1, Some("New IMMIGRATION rules"), 0.0),
            article("US", 1, Some("trade talks"), 0.0),
            article("US", 1, None, 0.0),
            article("GM", 1, Some("immigrants arrive"), 0.0),
        ];
        let kept = filter_by_keyword(rows, DEFAULT_KEYWORD);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].country_code, "GM");
    }

    #[test]
    fn date_filter_uses_calendar_day() {
        let rows = vec![article("US", 1, None, 0.0), article("US", 2, None, 0.0)];
        let kept = filter_by_date(rows, NaiveDate::from_ymd_opt(2023, 3, 2).unwrap());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn aggregates_count_and_mean_tone_sorted() {
        let rows = vec![
            article("US", 1, None, -2.0),
            article("GM", 1, None, 1.0),
            article("US", 1, None, -4.0),
        ];
        let agg = aggregate_by_country(&rows);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].country_code, "GM");
        assert_eq!(agg[1].count, Some(2));
        assert_eq!(agg[1].tone, Some(-3.0));
    }
}
