//! Joins news-article sentiment with yearly immigration and population
//! indicators, keyed by ISO 3166-1 alpha-3.
//!
//! The pipeline has four stages:
//!
//! 1. [`normalize`] rewrites the legacy (FIPS 10-4) codes used by the news
//!    dataset to alpha-2 using a mapping from [`code_registry`];
//! 2. [`enrich`] attaches alpha-3 codes from the embedded [`iso3166`] table;
//! 3. [`reshape::melt`] turns wide per-year indicator tables into long form;
//! 4. [`join::join_series`] matches immigrants with population per
//!    country-year and derives the rate.
//!
//! [`articles`] and [`views`] build the per-country aggregates and the
//! slices, rankings and scatter points the dashboard shows.

#![deny(missing_docs)]

pub mod articles;
pub mod config;
pub mod enrich;
pub mod errors;
pub mod iso3166;
pub mod join;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod reshape;
pub mod views;

pub use errors::{Error, ReshapeError};
pub use join::{JoinPolicy, JoinReport, JoinedRecord, join_series, join_series_with};
pub use models::{ArticleAggregate, ArticleRecord, CountryCode, CountryCoded, Enriched};
pub use normalize::NormalizeReport;
pub use reshape::{LongTable, TimeSeriesRecord, WideTable, melt};
