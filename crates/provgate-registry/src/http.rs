//! Shared reqwest client construction and status handling.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

/// User agent sent with every request.
pub const REGISTRY_USER_AGENT: &str = concat!("provgate-registry/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, String> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(REGISTRY_USER_AGENT));

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(default_headers)
        .build()
        .map_err(|e| format!("failed to create HTTP client: {}", e))
}

/// Body text of a successful response, or a reason naming the status.
pub(crate) async fn success_text(response: reqwest::Response) -> Result<String, String> {
    let status = response.status();
    if !status.is_success() {
        let reason = match status.as_u16() {
            401 | 403 => "unauthorized".to_string(),
            404 => "not found".to_string(),
            429 => "rate limited".to_string(),
            _ => "unexpected response".to_string(),
        };
        return Err(format!("HTTP {}: {}", status.as_u16(), reason));
    }

    response
        .text()
        .await
        .map_err(|e| format!("failed to read response body: {}", e))
}
