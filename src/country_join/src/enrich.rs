//! Attaching alpha-3 codes to country-keyed rows.

use code_registry::{CodeMapping, CodeRegistry};
use tracing::info;

use crate::errors::Error;
use crate::iso3166;
use crate::models::{CountryCoded, Enriched};
use crate::normalize::{self, NormalizeReport};

/// Alpha-3 code for an alpha-2 code, if it is a known ISO country.
pub fn alpha3_of(alpha2: &str) -> Option<String> {
    iso3166::alpha2_to_alpha3(alpha2).map(str::to_string)
}

/// Normalizes legacy codes with `mapping` and attaches alpha-3 codes.
pub fn enrich_with_mapping<T: CountryCoded>(
    mut rows: Vec<T>,
    mapping: &CodeMapping,
) -> (Vec<Enriched<T>>, NormalizeReport) {
    let report = normalize::legacy_to_alpha2(&mut rows, mapping);
    let enriched = rows
        .into_iter()
        .map(|row| {
            let alpha3 = alpha3_of(row.country_code());
            Enriched { row, alpha3 }
        })
        .collect();
    (enriched, report)
}

/// Fetches the mapping for `url` through `registry`, then enriches `rows`.
///
/// Fails with the registry error when the mapping cannot be obtained.
pub async fn enrich_country_codes<T: CountryCoded>(
    rows: Vec<T>,
    registry: &CodeRegistry,
    url: &str,
) -> Result<(Vec<Enriched<T>>, NormalizeReport), Error> {
    let mapping = registry.fetch_mapping(url).await?;
    let total = rows.len();
    let (rows, report) = enrich_with_mapping(rows, &mapping);
    info!(
        rows = total,
        converted = report.converted,
        unresolved = report.unresolved.len(),
        "enriched country codes"
    );
    Ok((rows, report))
}
