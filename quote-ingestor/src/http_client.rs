use std::time::Duration;

use reqwest::ClientBuilder;

/// Build a `reqwest::ClientBuilder` for backend calls.
///
/// No timeout is applied unless `timeout` is given; an unresponsive backend
/// otherwise stalls that refresh until the OS gives up on the socket.
///
/// Certificate verification is enabled by default. To accept self-signed
/// certificates (e.g. a development backend behind a local proxy), set
/// `QUOTES_ACCEPT_INVALID_CERTS` to `1`, `true` or `yes`.
pub fn builder(timeout: Option<Duration>) -> ClientBuilder {
    let mut builder = reqwest::Client::builder();
    let allow_invalid = std::env::var("QUOTES_ACCEPT_INVALID_CERTS")
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if allow_invalid {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
}
