//! Owned quote store and the refresh lifecycle around it.
//!
//! Every [`QuotePipeline::refresh`] takes a sequence number when it is
//! issued. On completion its result is applied only if no other refresh was
//! issued in the meantime, so the store always holds the outcome of the most
//! recently issued refresh. Superseded responses are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use analytics::{compute_view_with, PipelineConfig, Tab, ViewState};
use canonicalizer::{CanonicalMarket, ContractClassifier, PatternClassifier, Quote};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::QuoteSource;
use crate::metrics::{DISPLAYED_QUOTES, LAST_REFRESH_TIMESTAMP, REFRESHES, SUPERSEDED_RESPONSES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// What happened to one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { seq: u64, quotes: usize },
    Failed { seq: u64 },
    /// A newer refresh was issued while this one was in flight.
    Superseded { seq: u64, latest: u64 },
}

#[derive(Debug, Default)]
struct QuoteStore {
    quotes: Vec<Quote>,
    last_refresh: Option<DateTime<Utc>>,
    error: Option<String>,
    source_url: Option<String>,
    state: RefreshState,
}

pub struct QuotePipeline<S> {
    source: S,
    classifier: Box<dyn ContractClassifier>,
    issued: AtomicU64,
    store: Mutex<QuoteStore>,
}

impl<S: QuoteSource> QuotePipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            classifier: Box::new(PatternClassifier),
            issued: AtomicU64::new(0),
            store: Mutex::new(QuoteStore::default()),
        }
    }

    /// Replace the spot/futures heuristic.
    pub fn with_classifier(mut self, classifier: impl ContractClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch quotes for `market`/`tab` and replace the store with them.
    ///
    /// On failure the store is emptied and the error kept for display.
    pub async fn refresh(&self, market: CanonicalMarket, tab: Tab) -> RefreshOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.lock().await.state = RefreshState::Loading;
        debug!(seq, %market, %tab, "refresh issued");

        let result = self.source.fetch_quotes(market, tab).await;

        let mut store = self.store.lock().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if seq != latest {
            SUPERSEDED_RESPONSES.inc();
            debug!(seq, latest, "discarding superseded response");
            return RefreshOutcome::Superseded { seq, latest };
        }

        match result {
            Ok(payload) => {
                if let Some(err) = &payload.error {
                    warn!(seq, %market, error = %err, "backend reported a scrape error");
                }
                let quotes = payload.quotes();
                let count = quotes.len();
                let now = Utc::now();
                store.quotes = quotes;
                store.last_refresh = Some(now);
                store.error = None;
                if let Some(url) = payload.source_url {
                    store.source_url = Some(url);
                }
                store.state = RefreshState::Success;
                REFRESHES.with_label_values(&["success"]).inc();
                LAST_REFRESH_TIMESTAMP.set(now.timestamp_millis());
                info!(seq, %market, %tab, quotes = count, cached = payload.cached, "refresh applied");
                RefreshOutcome::Applied { seq, quotes: count }
            }
            Err(e) => {
                store.quotes.clear();
                store.error = Some(e.to_string());
                store.state = RefreshState::Failed;
                REFRESHES.with_label_values(&["failed"]).inc();
                warn!(seq, %market, %tab, error = %e, "refresh failed");
                RefreshOutcome::Failed { seq }
            }
        }
    }

    /// Current board for `cfg`, recomputed from the stored quotes.
    pub async fn view(&self, cfg: &PipelineConfig) -> ViewState {
        let store = self.store.lock().await;
        let mut view = compute_view_with(&store.quotes, cfg, self.classifier.as_ref());
        view.last_refresh = store.last_refresh;
        view.error = store.error.clone();
        view.loading = store.state == RefreshState::Loading;
        view.source_url = store.source_url.clone();
        DISPLAYED_QUOTES.set(view.quotes.len() as i64);
        view
    }

    pub async fn state(&self) -> RefreshState {
        self.store.lock().await.state
    }

    /// Quotes of the last applied refresh, before any view filtering.
    pub async fn raw_quotes(&self) -> Vec<Quote> {
        self.store.lock().await.quotes.clone()
    }
}
