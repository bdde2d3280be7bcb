use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CanonicalService;

/// Trading location whose quotes are tracked independently ("plaza").
///
/// The lowercase name is also the `plaza` query value understood by the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalMarket {
    #[default]
    Rosario,
    Bahia,
    Cordoba,
    Quequen,
    Darsena,
    Locales,
}

impl CanonicalMarket {
    pub const ALL: [CanonicalMarket; 6] = [
        CanonicalMarket::Rosario,
        CanonicalMarket::Bahia,
        CanonicalMarket::Cordoba,
        CanonicalMarket::Quequen,
        CanonicalMarket::Darsena,
        CanonicalMarket::Locales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalMarket::Rosario => "rosario",
            CanonicalMarket::Bahia => "bahia",
            CanonicalMarket::Cordoba => "cordoba",
            CanonicalMarket::Quequen => "quequen",
            CanonicalMarket::Darsena => "darsena",
            CanonicalMarket::Locales => "locales",
        }
    }

    /// Title used by the exchange tables for this market.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalMarket::Rosario => "Rosario",
            CanonicalMarket::Bahia => "Bahía Blanca",
            CanonicalMarket::Cordoba => "Córdoba",
            CanonicalMarket::Quequen => "Quequén",
            CanonicalMarket::Darsena => "Dársena",
            CanonicalMarket::Locales => "Locales",
        }
    }
}

impl fmt::Display for CanonicalMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing never fails: unknown names resolve to the default market.
impl FromStr for CanonicalMarket {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CanonicalService::canonical_market(s))
    }
}
