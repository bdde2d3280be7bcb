use std::net::SocketAddr;

use axum::{routing::get, Router};
use once_cell::sync::Lazy;
use prometheus::{
    gather, register_int_counter, register_int_counter_vec, register_int_gauge, Encoder,
    IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

pub static REFRESHES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "quote_refreshes_total",
        "Completed quote refreshes by outcome",
        &["outcome"]
    )
    .expect("register quote_refreshes_total")
});

pub static SUPERSEDED_RESPONSES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "quote_superseded_responses_total",
        "Responses discarded because a newer refresh was issued"
    )
    .expect("register quote_superseded_responses_total")
});

pub static ENDPOINT_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "backend_endpoint_fallbacks_total",
        "Backend calls that fell back to the next endpoint, by failing endpoint",
        &["endpoint"]
    )
    .expect("register backend_endpoint_fallbacks_total")
});

pub static LAST_REFRESH_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "quote_last_refresh_timestamp",
        "Unix timestamp (ms) of the last successful refresh"
    )
    .expect("register quote_last_refresh_timestamp")
});

pub static DISPLAYED_QUOTES: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "quote_displayed_total",
        "Quotes in the most recently computed view"
    )
    .expect("register quote_displayed_total")
});

async fn metrics_handler() -> impl axum::response::IntoResponse {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
    }

    (
        [(
            axum::http::header::CONTENT_TYPE,
            encoder.format_type().to_string(),
        )],
        buffer,
    )
}

async fn health_handler() -> &'static str {
    "ok"
}

pub async fn serve(addr: SocketAddr) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler));

    tracing::info!(%addr, "serving metrics");
    if let Err(e) = hyper::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!(error = %e, "metrics server error");
    }
}
