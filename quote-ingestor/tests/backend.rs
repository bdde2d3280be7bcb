use analytics::Tab;
use canonicalizer::{CanonicalMarket, Currency};
use httptest::all_of;
use httptest::{mappers::*, responders::*, Expectation, Server};
use httptest::mappers::contains_entry as contains;
use ingestor::backend::{BackendClient, QuoteSource};
use ingestor::fetcher::{Endpoint, ResilientFetcher};
use serde_json::json;

fn client(server: &Server, fallback_cache: bool) -> BackendClient {
    let fetcher = ResilientFetcher::new(
        reqwest::Client::new(),
        vec![Endpoint::SameOrigin(format!("http://{}", server.addr()))],
    );
    BackendClient::new(fetcher, fallback_cache)
}

#[tokio::test]
async fn quotes_request_carries_selection() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/cotizaciones"),
            request::query(url_decoded(contains(("plaza", "cordoba")))),
            request::query(url_decoded(contains(("only_base", "0")))),
            request::query(url_decoded(contains(("fallback_cache", "1")))),
        ])
        .respond_with(json_encoded(json!({
            "items": [
                {"producto": "Soja 05/2025", "precio": "1.234,50", "moneda": "U$S"},
                {"nombre": "Maíz", "precio": "s/c"},
                {"precio": 10}
            ],
            "plaza": "cordoba",
            "cached": true
        }))),
    );

    let payload = client(&server, true)
        .fetch_quotes(CanonicalMarket::Cordoba, Tab::Futures)
        .await
        .unwrap();
    assert!(payload.cached);
    assert_eq!(payload.plaza.as_deref(), Some("cordoba"));

    let quotes = payload.quotes();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].price, Some(1234.5));
    assert_eq!(quotes[0].currency, Currency::Usd);
    assert_eq!(quotes[1].product, "Maíz");
    assert_eq!(quotes[1].price, None);
}

#[tokio::test]
async fn backend_error_field_is_kept() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/cotizaciones"),
            request::query(url_decoded(contains(("fallback_cache", "0")))),
        ])
        .respond_with(json_encoded(json!({"items": [], "error": "timeout"}))),
    );

    let payload = client(&server, false)
        .quotes(CanonicalMarket::Rosario, true)
        .await
        .unwrap();
    assert!(payload.items.is_empty());
    assert_eq!(payload.error.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn start_automation_posts_interval() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/start"),
            request::query(url_decoded(contains(("plaza", "quequen")))),
            request::query(url_decoded(contains(("interval_min", "60")))),
        ])
        .respond_with(json_encoded(json!({"ok": true, "message": "scheduled"}))),
    );

    let resp = client(&server, true)
        .start_automation(CanonicalMarket::Quequen, 60)
        .await
        .unwrap();
    assert!(resp.ok);
    assert_eq!(resp.message.as_deref(), Some("scheduled"));
}

#[tokio::test]
async fn export_reports_count() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/api/export/oracle"),
            request::query(url_decoded(contains(("only_base", "1")))),
        ])
        .respond_with(json_encoded(json!({"ok": true, "exported": 12}))),
    );

    let resp = client(&server, true)
        .export_oracle(CanonicalMarket::Bahia, true)
        .await
        .unwrap();
    assert!(resp.ok);
    assert_eq!(resp.exported, Some(12));
}

#[tokio::test]
async fn csv_download_writes_file() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/csv"),
            request::query(url_decoded(contains(("plaza", "darsena")))),
        ])
        .respond_with(
            status_code(200)
                .insert_header("content-type", "text/csv")
                .body("producto,precio\nTrigo,200\n"),
        ),
    );

    let bytes = client(&server, true)
        .download_csv(CanonicalMarket::Darsena, true)
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join(ingestor::backend::csv_file_name(CanonicalMarket::Darsena));
    tokio::fs::write(&path, &bytes).await.unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("producto,precio"));
    assert!(path.ends_with("cotizaciones_darsena.csv"));
}
