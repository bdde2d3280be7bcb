use thiserror::Error;

/// Failure of a backend call after every endpoint has been tried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint could not be reached.
    #[error("request to {url} failed: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
        url: String,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    /// Typically an HTML error page served with 200 OK.
    #[error("{url} answered with content type {content_type:?} instead of JSON")]
    ContentType { url: String, content_type: String },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        url: String,
    },
    #[error("no API endpoint configured")]
    NoEndpoint,
}

impl FetchError {
    /// Transport-level failure, as opposed to a bad answer.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. } | FetchError::NoEndpoint)
    }

    /// The endpoint answered, but not with what was asked for.
    pub fn is_protocol(&self) -> bool {
        !self.is_network()
    }
}

#[derive(Debug, Error)]
pub enum IngestorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("backend rejected {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}
