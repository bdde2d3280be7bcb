use std::cmp::Reverse;

use canonicalizer::{dedupe, fold, ContractClassifier, PatternClassifier, Quote};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{PipelineConfig, Tab};

/// Aggregates over the displayed quote list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// Mean of the priced quotes, `0.0` when none are priced.
    pub average_price: f64,
    /// Number of priced quotes.
    pub active_count: usize,
}

impl Kpis {
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let (sum, count) = quotes
            .iter()
            .filter_map(|q| q.price)
            .fold((0.0, 0usize), |(sum, n), p| (sum + p, n + 1));
        let average_price = if count == 0 { 0.0 } else { sum / count as f64 };
        Self {
            average_price,
            active_count: count,
        }
    }
}

/// Everything a front end needs to draw the quote board.
///
/// Always rebuilt from the raw quotes and the current [`PipelineConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pub quotes: Vec<Quote>,
    pub kpis: Kpis,
    pub last_refresh: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub loading: bool,
    pub source_url: Option<String>,
}

/// Derive the displayed list and KPIs with the default classifier.
pub fn compute_view(raw: &[Quote], cfg: &PipelineConfig) -> ViewState {
    compute_view_with(raw, cfg, &PatternClassifier)
}

/// Derive the displayed list and KPIs.
///
/// Stages: tab partition, currency filter, dedupe, optional removal of
/// unpriced rows, then priced-first ordering by product name.
pub fn compute_view_with(
    raw: &[Quote],
    cfg: &PipelineConfig,
    classifier: &dyn ContractClassifier,
) -> ViewState {
    let want_futures = cfg.tab == Tab::Futures;
    let selected = raw
        .iter()
        .filter(|q| classifier.is_futures(&q.product) == want_futures)
        .filter(|q| q.currency == cfg.currency)
        .cloned();

    let mut quotes = dedupe(selected);
    if cfg.hide_unpriced {
        quotes.retain(Quote::has_price);
    }
    quotes.sort_by_cached_key(|q| (Reverse(q.has_price()), fold(&q.product), q.product.clone()));

    let kpis = Kpis::from_quotes(&quotes);
    ViewState {
        quotes,
        kpis,
        ..ViewState::default()
    }
}
