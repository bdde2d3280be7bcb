//! HTTP access to the quote backend with ordered endpoint fallback.
//!
//! A [`ResilientFetcher`] holds an ordered list of [`Endpoint`]s. Each call
//! tries them in turn and returns the first success; a failure on one
//! endpoint is logged and the next is tried with the identical request.
//! Only the last endpoint's error reaches the caller. There are no retries
//! and no backoff beyond walking the list once.

use hyper::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{FetchError, IngestorError};
use crate::http_client;
use crate::metrics::ENDPOINT_FALLBACKS;

/// Port the backend listens on in local development.
pub const DEV_API_PORT: u16 = 8000;

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Explicitly configured (or inferred) API base.
    Absolute(String),
    /// The origin that serves the board itself.
    SameOrigin(String),
}

impl Endpoint {
    pub fn base(&self) -> &str {
        match self {
            Endpoint::Absolute(b) | Endpoint::SameOrigin(b) => b,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Endpoint::Absolute(_) => "absolute",
            Endpoint::SameOrigin(_) => "same_origin",
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Build the attempt list: the absolute base first (configured, or inferred
/// when the origin is a loopback host), then the origin.
pub fn discover_endpoints(api_base: Option<&str>, origin: &str) -> Vec<Endpoint> {
    let origin = origin.trim().trim_end_matches('/');
    let absolute = api_base
        .map(|b| b.trim().trim_end_matches('/'))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .or_else(|| infer_dev_base(origin));

    let mut endpoints = Vec::new();
    if let Some(base) = absolute {
        if base != origin {
            endpoints.push(Endpoint::Absolute(base));
        }
    }
    if !origin.is_empty() {
        endpoints.push(Endpoint::SameOrigin(origin.to_string()));
    }
    endpoints
}

fn infer_dev_base(origin: &str) -> Option<String> {
    let url = reqwest::Url::parse(origin).ok()?;
    let host = url.host_str()?;
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    let loopback = bare.eq_ignore_ascii_case("localhost")
        || bare
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false);
    if !loopback || url.port_or_known_default() == Some(DEV_API_PORT) {
        return None;
    }
    Some(format!("{}://{}:{}", url.scheme(), host, DEV_API_PORT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Method and query string of a backend call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::Post,
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Json,
    Blob,
}

fn is_json(content_type: &str) -> bool {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    media == "application/json" || media.ends_with("+json")
}

pub struct ResilientFetcher {
    client: reqwest::Client,
    endpoints: Vec<Endpoint>,
}

impl ResilientFetcher {
    pub fn new(client: reqwest::Client, endpoints: Vec<Endpoint>) -> Self {
        Self { client, endpoints }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, IngestorError> {
        let client = http_client::builder(settings.http_timeout())
            .build()
            .map_err(IngestorError::Client)?;
        let endpoints = discover_endpoints(settings.api_base.as_deref(), &settings.origin);
        debug!(?endpoints, "backend endpoints");
        Ok(Self::new(client, endpoints))
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Fetch a JSON document. Answers that are not declared as JSON count
    /// as failures, so an HTML page served with 200 falls through.
    pub async fn fetch_json(&self, path: &str, opts: &RequestOptions) -> Result<Value, FetchError> {
        self.run(path, opts, Expect::Json, |url, body| {
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                source,
                url: url.to_string(),
            })
        })
        .await
    }

    /// Fetch a binary payload (e.g. the CSV export).
    pub async fn fetch_blob(&self, path: &str, opts: &RequestOptions) -> Result<Bytes, FetchError> {
        self.run(path, opts, Expect::Blob, |_, body| Ok(body)).await
    }

    async fn run<T, F>(
        &self,
        path: &str,
        opts: &RequestOptions,
        expect: Expect,
        decode: F,
    ) -> Result<T, FetchError>
    where
        F: Fn(&str, Bytes) -> Result<T, FetchError>,
    {
        let mut last_err = FetchError::NoEndpoint;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            let outcome = self
                .attempt(endpoint, path, opts, expect)
                .await
                .and_then(|(url, body)| decode(&url, body));
            match outcome {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    if let Some(next) = self.endpoints.get(i + 1) {
                        warn!(
                            endpoint = endpoint.kind(),
                            next = next.kind(),
                            error = %e,
                            "backend call failed; falling back"
                        );
                        ENDPOINT_FALLBACKS
                            .with_label_values(&[endpoint.kind()])
                            .inc();
                    }
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    /// One request against one endpoint; returns the URL and the body of a
    /// successful answer.
    async fn attempt(
        &self,
        endpoint: &Endpoint,
        path: &str,
        opts: &RequestOptions,
        expect: Expect,
    ) -> Result<(String, Bytes), FetchError> {
        let url = endpoint.url(path);
        let request = match opts.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let resp = request
            .query(&opts.query)
            .send()
            .await
            .map_err(|source| FetchError::Network {
                source,
                url: url.clone(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }
        if expect == Expect::Json {
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            if !is_json(&content_type) {
                return Err(FetchError::ContentType { url, content_type });
            }
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Network {
            source,
            url: url.clone(),
        })?;
        debug!(%url, bytes = body.len(), "backend answered");
        Ok((url, body))
    }
}
