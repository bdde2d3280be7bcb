//! Utilities for canonicalizing grain quotes published by the exchange
//! backend.
//!
//! The [`CanonicalService`] maps free-text market identifiers ("Bahía
//! Blanca", `BBCA`, `cba`) onto a [`CanonicalMarket`] and turns raw backend
//! records into [`Quote`]s, tolerating the different field spellings the
//! backend has used. [`contract`] separates spot quotes from forward
//! contracts and [`dedupe`] collapses repeated `(product, currency)` rows.

pub mod contract;
pub mod dedupe;
pub mod market;
pub mod quote;
mod text;

pub use contract::{is_futures, ContractClassifier, PatternClassifier};
pub use dedupe::dedupe;
pub use market::CanonicalMarket;
pub use quote::{Currency, Quote, DEFAULT_DELIVERY, NO_PRICE};
pub use text::{fold, fold_words};

use serde_json::Value;

/// Exact aliases resolved before pattern matching.
const ROSARIO_ALIASES: [&str; 3] = ["rosario", "ros", "ros spot"];

/// Market patterns in priority order; the first match wins.
const MARKET_PATTERNS: [(CanonicalMarket, &[&str]); 5] = [
    (CanonicalMarket::Bahia, &["bahia", "bbca", "bb"]),
    (CanonicalMarket::Cordoba, &["cordoba", "cba", "cor", "cb"]),
    (CanonicalMarket::Quequen, &["quequen", "qqn", "que"]),
    (CanonicalMarket::Darsena, &["darsena", "dar"]),
    (
        CanonicalMarket::Locales,
        &["mercado local", "mercadolocal", "locales", "local", "loc"],
    ),
];

pub struct CanonicalService;

impl CanonicalService {
    /// Resolve a free-text market name. Case, accents and `-`/`_`
    /// separators are ignored; anything unrecognised is Rosario.
    pub fn canonical_market(raw: &str) -> CanonicalMarket {
        let name = fold_words(raw);
        if name.is_empty() || ROSARIO_ALIASES.contains(&name.as_str()) {
            return CanonicalMarket::Rosario;
        }
        MARKET_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| Self::matches(&name, p)))
            .map(|(market, _)| *market)
            .unwrap_or_default()
    }

    /// A pattern matches the whole name, its leading words, or one of its
    /// words.
    fn matches(name: &str, pattern: &str) -> bool {
        if name == pattern {
            return true;
        }
        if let Some(rest) = name.strip_prefix(pattern) {
            if rest.starts_with(' ') {
                return true;
            }
        }
        name.split(' ').any(|w| w == pattern)
    }

    /// Map raw backend records into quotes; see [`Quote::from_record`].
    pub fn canonical_quotes(records: &[Value]) -> Vec<Quote> {
        quote::map_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::{CanonicalMarket, CanonicalService};

    #[test]
    fn bahia_aliases() {
        for raw in ["bahía blanca", "BBCA", "bb", "Bahia", "bahia-blanca", "BAHÍA_BLANCA"] {
            assert_eq!(
                CanonicalService::canonical_market(raw),
                CanonicalMarket::Bahia,
                "{raw}"
            );
        }
    }

    #[test]
    fn other_markets_are_recognised() {
        let cases = [
            ("Córdoba", CanonicalMarket::Cordoba),
            ("CBA", CanonicalMarket::Cordoba),
            ("cor", CanonicalMarket::Cordoba),
            ("cb", CanonicalMarket::Cordoba),
            ("Quequén", CanonicalMarket::Quequen),
            ("qqn", CanonicalMarket::Quequen),
            ("que", CanonicalMarket::Quequen),
            ("Dársena", CanonicalMarket::Darsena),
            ("dar", CanonicalMarket::Darsena),
            ("loc", CanonicalMarket::Locales),
            ("Locales", CanonicalMarket::Locales),
            ("Mercado Local", CanonicalMarket::Locales),
            ("ros-spot", CanonicalMarket::Rosario),
        ];
        for (raw, expected) in cases {
            assert_eq!(CanonicalService::canonical_market(raw), expected, "{raw}");
        }
    }

    #[test]
    fn empty_or_unknown_defaults_to_rosario() {
        assert_eq!(CanonicalService::canonical_market(""), CanonicalMarket::Rosario);
        assert_eq!(CanonicalService::canonical_market("   "), CanonicalMarket::Rosario);
        assert_eq!(
            CanonicalService::canonical_market("Buenos Aires"),
            CanonicalMarket::Rosario
        );
        assert_eq!(CanonicalService::canonical_market("%%/??"), CanonicalMarket::Rosario);
    }

    #[test]
    fn earlier_patterns_take_priority() {
        assert_eq!(
            CanonicalService::canonical_market("bb dar"),
            CanonicalMarket::Bahia
        );
    }
}
