//! Row types flowing through the pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use code_registry::CodeMapping;
use serde::{Deserialize, Deserializer, Serialize};

use crate::iso3166;

/// A row type with a country-code column that normalization may rewrite.
pub trait CountryCoded {
    /// Current value of the code column.
    fn country_code(&self) -> &str;
    /// Replaces the value of the code column.
    fn set_country_code(&mut self, code: String);
}

/// A country code tagged with the scheme it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "code", rename_all = "snake_case")]
pub enum CountryCode {
    /// Legacy (FIPS 10-4) code as used by the news dataset.
    Legacy(String),
    /// ISO 3166-1 alpha-2.
    Alpha2(String),
    /// ISO 3166-1 alpha-3.
    Alpha3(String),
}

impl CountryCode {
    /// The raw code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Legacy(c) | Self::Alpha2(c) | Self::Alpha3(c) => c,
        }
    }

    /// Alpha-2 form, if representable.
    pub fn to_alpha2(&self, mapping: &CodeMapping) -> Option<String> {
        match self {
            Self::Legacy(c) => mapping.alpha2_for(c).map(str::to_string),
            Self::Alpha2(c) => iso3166::alpha2_to_alpha3(c).map(|_| c.to_ascii_uppercase()),
            Self::Alpha3(c) => iso3166::alpha3_to_alpha2(c).map(str::to_string),
        }
    }

    /// Alpha-3 form, if representable.
    pub fn to_alpha3(&self, mapping: &CodeMapping) -> Option<String> {
        let alpha2 = self.to_alpha2(mapping)?;
        iso3166::alpha2_to_alpha3(&alpha2).map(str::to_string)
    }

    /// Legacy form, if representable.
    pub fn to_legacy(&self, mapping: &CodeMapping) -> Option<String> {
        match self {
            Self::Legacy(c) => Some(c.clone()),
            other => {
                let alpha2 = other.to_alpha2(mapping)?;
                mapping.legacy_for(&alpha2).map(str::to_string)
            }
        }
    }
}

/// One news item about immigration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Publication timestamp (UTC).
    #[serde(rename = "DateTime", deserialize_with = "de_timestamp")]
    pub date_time: DateTime<Utc>,
    /// Country code; legacy on input, alpha-2 after normalization.
    #[serde(rename = "CountryCode")]
    pub country_code: String,
    /// Headline.
    #[serde(rename = "Title", default)]
    pub title: String,
    /// Text snippet around the matched keyword; may be missing.
    #[serde(rename = "ContextualText", default)]
    pub contextual_text: Option<String>,
    /// Document tone score.
    #[serde(rename = "DocTone")]
    pub doc_tone: f64,
    /// Article URL, when the source provides it.
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl CountryCoded for ArticleRecord {
    fn country_code(&self) -> &str {
        &self.country_code
    }
    fn set_country_code(&mut self, code: String) {
        self.country_code = code;
    }
}

/// Per-country article metrics (count and/or mean tone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleAggregate {
    /// Country code; legacy on input, alpha-2 after normalization.
    #[serde(rename = "CountryCode")]
    pub country_code: String,
    /// Number of articles.
    #[serde(rename = "Count", default)]
    pub count: Option<u64>,
    /// Mean document tone.
    #[serde(rename = "Tone", default)]
    pub tone: Option<f64>,
}

impl CountryCoded for ArticleAggregate {
    fn country_code(&self) -> &str {
        &self.country_code
    }
    fn set_country_code(&mut self, code: String) {
        self.country_code = code;
    }
}

/// A row plus its derived alpha-3 code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enriched<T> {
    /// The normalized row.
    #[serde(flatten)]
    pub row: T,
    /// Alpha-3 code, `None` when the row's code is not ISO alpha-2.
    #[serde(rename = "Alpha3Code")]
    pub alpha3: Option<String>,
}

/// Accepts RFC 3339 or the warehouse's `YYYY-MM-DD HH:MM:SS[.f]` (read as UTC).
fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z"))
    {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y%m%d%H%M%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
