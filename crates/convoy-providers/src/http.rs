//! HTTP plumbing shared by every adapter.

use convoy_core::{ConnectionTest, ProviderError, ProviderType};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Send a request and decode a 2xx JSON body.
///
/// Non-2xx answers become [`ProviderError::Status`] with the body truncated.
pub async fn send_json<T: DeserializeOwned>(
    provider: ProviderType,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::transport(provider, e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider, e.to_string()))?;

    if !status.is_success() {
        tracing::warn!(provider = %provider, status = status.as_u16(), "Provider request failed");
        return Err(ProviderError::status(provider, status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::invalid_response(provider, e.to_string()))
}

/// User-facing explanation of a failed connectivity probe.
pub fn describe_status(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Invalid API key".to_string(),
        403 => "Access forbidden: the API key lacks permission for this endpoint".to_string(),
        429 => "Rate limited: too many requests, try again later".to_string(),
        404 => "Endpoint not found: check the base URL".to_string(),
        code => format!("Connection failed with status {code}"),
    }
}

/// Run a connectivity probe, extracting model names from the JSON body.
///
/// Never fails: every problem ends up in [`ConnectionTest::error`].
pub async fn probe<F>(request: RequestBuilder, models: F) -> ConnectionTest
where
    F: FnOnce(&serde_json::Value) -> Option<Vec<String>>,
{
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return ConnectionTest::failed(format!("Connection failed: {e}")),
    };

    let status = response.status();
    if !status.is_success() {
        return ConnectionTest::failed(describe_status(status));
    }

    let body = response.json::<serde_json::Value>().await.unwrap_or_default();
    ConnectionTest::ok(models(&body))
}

/// Strip trailing slashes so paths can be appended with `/`.
pub fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
