use analytics::Tab;
use async_trait::async_trait;
use hyper::body::Bytes;
use canonicalizer::{CanonicalMarket, CanonicalService, Quote};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;
use crate::fetcher::{RequestOptions, ResilientFetcher};

pub const QUOTES_PATH: &str = "/api/cotizaciones";
pub const START_PATH: &str = "/api/start";
pub const EXPORT_PATH: &str = "/api/export/oracle";
pub const CSV_PATH: &str = "/api/csv";

/// Answer of the quotes endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotesPayload {
    pub items: Vec<Value>,
    pub source_url: Option<String>,
    /// Backend's canonical name for the requested market.
    pub plaza: Option<String>,
    /// Served from the backend cache.
    pub cached: bool,
    /// Scrape failure reported by the backend next to an (empty) item list.
    pub error: Option<String>,
}

impl QuotesPayload {
    /// Read the payload without failing: missing or mistyped fields are
    /// treated as absent, and a bare array is taken as the item list.
    pub fn from_value(value: Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.is_empty())
        };
        let items = match &value {
            Value::Array(items) => items.clone(),
            other => other
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };
        Self {
            items,
            source_url: text("source_url"),
            plaza: text("plaza"),
            cached: value.get("cached").and_then(Value::as_bool).unwrap_or(false),
            error: text("error"),
        }
    }

    pub fn quotes(&self) -> Vec<Quote> {
        CanonicalService::canonical_quotes(&self.items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub interval_min: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub exported: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Where refreshed quotes come from.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(
        &self,
        market: CanonicalMarket,
        tab: Tab,
    ) -> Result<QuotesPayload, FetchError>;
}

/// Default file name of the CSV export, as the backend names its attachment.
pub fn csv_file_name(market: CanonicalMarket) -> String {
    format!("cotizaciones_{}.csv", market)
}

fn flag(on: bool) -> u8 {
    u8::from(on)
}

/// Typed calls to the scraping/export backend.
pub struct BackendClient {
    fetcher: ResilientFetcher,
    fallback_cache: bool,
}

impl BackendClient {
    pub fn new(fetcher: ResilientFetcher, fallback_cache: bool) -> Self {
        Self {
            fetcher,
            fallback_cache,
        }
    }

    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    pub async fn quotes(
        &self,
        market: CanonicalMarket,
        only_base: bool,
    ) -> Result<QuotesPayload, FetchError> {
        let opts = RequestOptions::get()
            .param("plaza", market)
            .param("only_base", flag(only_base))
            .param("fallback_cache", flag(self.fallback_cache));
        let value = self.fetcher.fetch_json(QUOTES_PATH, &opts).await?;
        Ok(QuotesPayload::from_value(value))
    }

    /// Ask the backend to scrape `market` every `interval_min` minutes.
    pub async fn start_automation(
        &self,
        market: CanonicalMarket,
        interval_min: u64,
    ) -> Result<StartResponse, FetchError> {
        let opts = RequestOptions::post()
            .param("plaza", market)
            .param("interval_min", interval_min);
        let value = self.fetcher.fetch_json(START_PATH, &opts).await?;
        serde_json::from_value(value).map_err(|source| FetchError::Decode {
            source,
            url: START_PATH.to_string(),
        })
    }

    pub async fn export_oracle(
        &self,
        market: CanonicalMarket,
        only_base: bool,
    ) -> Result<ExportResponse, FetchError> {
        let opts = RequestOptions::post()
            .param("plaza", market)
            .param("only_base", flag(only_base));
        let value = self.fetcher.fetch_json(EXPORT_PATH, &opts).await?;
        serde_json::from_value(value).map_err(|source| FetchError::Decode {
            source,
            url: EXPORT_PATH.to_string(),
        })
    }

    pub async fn download_csv(
        &self,
        market: CanonicalMarket,
        only_base: bool,
    ) -> Result<Bytes, FetchError> {
        let opts = RequestOptions::get()
            .param("plaza", market)
            .param("only_base", flag(only_base))
            .param("fallback_cache", flag(self.fallback_cache));
        self.fetcher.fetch_blob(CSV_PATH, &opts).await
    }
}

#[async_trait]
impl QuoteSource for BackendClient {
    async fn fetch_quotes(
        &self,
        market: CanonicalMarket,
        tab: Tab,
    ) -> Result<QuotesPayload, FetchError> {
        self.quotes(market, tab.only_base()).await
    }
}
