//! Streamable HTTP transport.
//!
//! Every message is a POST. The server answers with either a JSON body or
//! a short event stream; the session id it hands out is echoed on every
//! later request.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use convoy_core::McpClientError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use url::Url;

use super::sse_parser::parse_all;
use super::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Transport, header_map, http_error,
};

pub const SESSION_HEADER: &str = "mcp-session-id";

pub struct StreamableHttpTransport {
    http: reqwest::Client,
    url: Url,
    headers: HeaderMap,
    session_id: Mutex<Option<String>>,
}

impl StreamableHttpTransport {
    pub fn new(url: &str, headers: &BTreeMap<String, String>) -> Result<Self, McpClientError> {
        let url = Url::parse(url)
            .map_err(|e| McpClientError::InvalidConfig(format!("Invalid url {url}: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            url,
            headers: header_map(headers)?,
            session_id: Mutex::new(None),
        })
    }

    fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn post(&self, body: &impl serde::Serialize) -> Result<reqwest::Response, McpClientError> {
        let mut request = self
            .http
            .post(self.url.clone())
            .headers(self.headers.clone())
            .header(ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(session) = self.session_id() {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await.map_err(|e| http_error(&e))?;

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self
                .session_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(session.to_string());
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpClientError::Http(format!(
                "POST failed with status {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for StreamableHttpTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpClientError> {
        let response = self.post(&request).await?;
        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = response.text().await.map_err(|e| http_error(&e))?;

        if !is_stream {
            return Ok(serde_json::from_str(&body)?);
        }

        parse_all(&body)
            .into_iter()
            .filter_map(|event| serde_json::from_str::<JsonRpcResponse>(&event.data).ok())
            .find(|message| message.answers(request.id))
            .ok_or_else(|| {
                McpClientError::ProtocolError(format!(
                    "Event stream ended without a response to request {}",
                    request.id
                ))
            })
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpClientError> {
        self.post(&notification).await.map(drop)
    }

    async fn close(&self) {
        let Some(session) = self.session_id() else {
            return;
        };
        let result = self
            .http
            .delete(self.url.clone())
            .headers(self.headers.clone())
            .header(SESSION_HEADER, session)
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "Failed to end streamable HTTP session");
        }
    }
}
