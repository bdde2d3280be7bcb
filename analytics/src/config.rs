use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use canonicalizer::{CanonicalMarket, Currency};
use serde::{Deserialize, Serialize};

/// Shortest refresh interval, in minutes.
pub const MIN_INTERVAL_MIN: u64 = 1;
/// Longest interval the backend scheduler accepts (one week), in minutes.
pub const MAX_INTERVAL_MIN: u64 = 60 * 24 * 7;
pub const DEFAULT_INTERVAL_MIN: u64 = 15;

/// Which partition of the quote list is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Base,
    Futures,
}

impl Tab {
    /// Value of the backend's `only_base` query flag.
    pub fn only_base(&self) -> bool {
        matches!(self, Tab::Base)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Base => "base",
            Tab::Futures => "futures",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "futures" | "futuros" | "forward" | "0" => Tab::Futures,
            _ => Tab::Base,
        })
    }
}

/// Session-scoped display and refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub market: CanonicalMarket,
    #[serde(default)]
    pub tab: Tab,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub hide_unpriced: bool,
    #[serde(default = "default_interval_min")]
    pub interval_min: u64,
}

fn default_interval_min() -> u64 {
    DEFAULT_INTERVAL_MIN
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            market: CanonicalMarket::default(),
            tab: Tab::default(),
            currency: Currency::default(),
            hide_unpriced: false,
            interval_min: DEFAULT_INTERVAL_MIN,
        }
    }
}

impl PipelineConfig {
    pub fn interval_min(&self) -> u64 {
        self.interval_min.clamp(MIN_INTERVAL_MIN, MAX_INTERVAL_MIN)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_min() * 60)
    }

    /// True when a change from `other` requires fetching again rather than
    /// only recomputing the view.
    pub fn needs_refetch(&self, other: &PipelineConfig) -> bool {
        self.market != other.market || self.tab != other.tab
    }
}
