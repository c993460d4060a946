//! Code normalization between the legacy, alpha-2 and alpha-3 schemes.
//!
//! Two error policies live side by side and are kept apart on purpose:
//!
//! - column rewrites ([`legacy_to_alpha2`], [`alpha2_to_legacy`]) leave a code
//!   they cannot map untouched, so downstream joins still see the original;
//! - pure conversions ([`alpha2_to_alpha3`], [`alpha3_to_alpha2`]) return
//!   `None` when the input has no representation in the target scheme.

use std::collections::BTreeSet;

use code_registry::CodeMapping;
use tracing::debug;

pub use crate::iso3166::{alpha2_to_alpha3, alpha3_to_alpha2};
use crate::models::CountryCoded;

/// Outcome of a column rewrite.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows whose code was found in the mapping.
    pub converted: usize,
    /// Rows left unchanged because their code was not in the mapping.
    pub passed_through: usize,
    /// Distinct codes that had no mapping entry.
    pub unresolved: BTreeSet<String>,
}

/// Rewrites each record's legacy code to alpha-2.
///
/// Codes with no mapping entry are left as they are and reported.
pub fn legacy_to_alpha2<T: CountryCoded>(records: &mut [T], mapping: &CodeMapping) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    for record in records.iter_mut() {
        match mapping.alpha2_for(record.country_code()) {
            Some(alpha2) => {
                let alpha2 = alpha2.to_string();
                record.set_country_code(alpha2);
                report.converted += 1;
            }
            None => {
                report.passed_through += 1;
                report.unresolved.insert(record.country_code().to_string());
            }
        }
    }
    if !report.unresolved.is_empty() {
        debug!(
            unresolved = ?report.unresolved,
            rows = report.passed_through,
            "legacy codes without an alpha-2 mapping left unchanged"
        );
    }
    report
}

/// Maps alpha-2 codes back to legacy codes; unknown codes pass through.
pub fn alpha2_to_legacy<S: AsRef<str>>(codes: &[S], mapping: &CodeMapping) -> Vec<String> {
    codes
        .iter()
        .map(|c| {
            let c = c.as_ref();
            mapping.legacy_for(c).unwrap_or(c).to_string()
        })
        .collect()
}

/// Expresses a selection of alpha-3 codes in the legacy scheme.
///
/// Codes that are not ISO alpha-3 are dropped; alpha-2 codes with no legacy
/// entry pass through as alpha-2 (same policy as [`alpha2_to_legacy`]).
pub fn alpha3_to_legacy<S: AsRef<str>>(codes: &[S], mapping: &CodeMapping) -> Vec<String> {
    let alpha2: Vec<&str> = codes
        .iter()
        .filter_map(|c| alpha3_to_alpha2(c.as_ref()))
        .collect();
    alpha2_to_legacy(&alpha2, mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleAggregate;
    use proptest::prelude::*;

    fn rows(codes: &[&str]) -> Vec<ArticleAggregate> {
        codes
            .iter()
            .map(|c| ArticleAggregate {
                country_code: c.to_string(),
                count: Some(1),
                tone: None,
            })
            .collect()
    }

    fn codes(rows: &[ArticleAggregate]) -> Vec<&str> {
        rows.iter().map(|r| r.country_code.as_str()).collect()
    }

    #[test]
    fn rewrites_known_legacy_codes() {
        let m = CodeMapping::from_pairs([("JA", "JP"), ("GM", "DE"), ("IZ", "IQ")]);
        let mut r = rows(&["JA", "GM", "IZ"]);

        let report = legacy_to_alpha2(&mut r, &m);

        assert_eq!(codes(&r), vec!["JP", "DE", "IQ"]);
        assert_eq!(report.converted, 3);
        assert!(report.unresolved.is_empty());
    }

    #[test]
    fn unknown_codes_pass_through_unchanged() {
        let m = CodeMapping::from_pairs([("JA", "JP")]);
        let mut r = rows(&["JA", "XX", "", "XX"]);

        let report = legacy_to_alpha2(&mut r, &m);

        assert_eq!(codes(&r), vec!["JP", "XX", "", "XX"]);
        assert_eq!(report.passed_through, 3);
        assert_eq!(report.unresolved.len(), 2);
    }

    #[test]
    fn mapping_is_applied_once_not_chained() {
        // RS -> RU and RI -> RS: a serbian row must end as RS, not RU.
        let m = CodeMapping::from_pairs([("RS", "RU"), ("RI", "RS")]);
        let mut r = rows(&["RI", "RS"]);
        legacy_to_alpha2(&mut r, &m);
        assert_eq!(codes(&r), vec!["RS", "RU"]);
    }

    #[test]
    fn reverse_lookup_passes_unknowns_through() {
        let m = CodeMapping::from_pairs([("JA", "JP"), ("GM", "DE")]);
        assert_eq!(alpha2_to_legacy(&["DE", "JP", "FR"], &m), vec!["GM", "JA", "FR"]);
    }

    #[test]
    fn alpha3_selection_to_legacy() {
        let m = CodeMapping::from_pairs([("SW", "SE"), ("PL", "PL"), ("GM", "DE")]);
        let out = alpha3_to_legacy(&["SWE", "POL", "DEU", "XKX", "CAN"], &m);
        assert_eq!(out, vec!["SW", "PL", "GM", "CA"]);
    }

    #[test]
    fn iso_conversions() {
        assert_eq!(alpha2_to_alpha3("US"), Some("USA"));
        assert_eq!(alpha2_to_alpha3("ZZ"), None);
        assert_eq!(alpha3_to_alpha2("USA"), Some("US"));
    }

    proptest! {
        #[test]
        fn codes_outside_the_registry_are_untouched(code in "[A-Za-z0-9]{0,4}") {
            let m = code_registry::StaticTable::bundled().unwrap().to_mapping();
            prop_assume!(m.alpha2_for(&code).is_none());
            let mut r = rows(&[code.as_str()]);
            legacy_to_alpha2(&mut r, &m);
            prop_assert_eq!(r[0].country_code.as_str(), code.as_str());
        }
    }
}
