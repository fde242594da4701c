//! Legacy HTTP+SSE transport.
//!
//! The client opens a GET event stream. The server's first `endpoint`
//! event names the URL that requests are POSTed to; responses come back
//! on the stream as `message` events and are matched to waiters by id.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use convoy_core::McpClientError;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, HeaderMap};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use url::Url;

use super::sse_parser::SseParser;
use super::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Transport, header_map, http_error,
};

/// How long to wait for the `endpoint` event after the stream opens.
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(30);

/// Waiters keyed by request id. `closed` is set once the reader exits,
/// under the same lock, so no waiter can be registered after the drain.
#[derive(Default)]
struct Waiters {
    closed: bool,
    senders: HashMap<u64, oneshot::Sender<JsonRpcResponse>>,
}

type Pending = Arc<Mutex<Waiters>>;

fn stream_closed() -> McpClientError {
    McpClientError::ProtocolError("SSE stream closed".to_string())
}

pub struct SseTransport {
    http: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    pending: Pending,
    reader: JoinHandle<()>,
}

impl SseTransport {
    /// Open the event stream and wait for the POST endpoint.
    pub async fn connect(
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self, McpClientError> {
        let base = Url::parse(url)
            .map_err(|e| McpClientError::InvalidConfig(format!("Invalid SSE url {url}: {e}")))?;
        let headers = header_map(headers)?;
        let http = reqwest::Client::new();

        let response = http
            .get(base.clone())
            .headers(headers.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| http_error(&e))?;
        if !response.status().is_success() {
            return Err(McpClientError::Http(format!(
                "SSE stream request failed with status {}",
                response.status()
            )));
        }

        let pending: Pending = Arc::default();
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        let reader = tokio::spawn(read_stream(response, base, endpoint_tx, Arc::clone(&pending)));

        let endpoint = match timeout(ENDPOINT_TIMEOUT, endpoint_rx).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) => {
                reader.abort();
                return Err(McpClientError::ProtocolError(
                    "SSE stream closed before endpoint event".to_string(),
                ));
            }
            Err(_) => {
                reader.abort();
                return Err(McpClientError::Timeout);
            }
        };
        tracing::debug!(endpoint = %endpoint, "SSE endpoint announced");

        Ok(Self {
            http,
            endpoint,
            headers,
            pending,
            reader,
        })
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .remove(&id);
    }

    async fn post(&self, body: &impl serde::Serialize) -> Result<(), McpClientError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| http_error(&e))?;
        if !response.status().is_success() {
            return Err(McpClientError::Http(format!(
                "SSE POST failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

async fn read_stream(
    response: reqwest::Response,
    base: Url,
    endpoint_tx: oneshot::Sender<Url>,
    pending: Pending,
) {
    let mut endpoint_tx = Some(endpoint_tx);
    let mut parser = SseParser::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "SSE stream error");
                break;
            }
        };

        for event in parser.push(&chunk) {
            match event.event.as_str() {
                "endpoint" => {
                    let Some(tx) = endpoint_tx.take() else {
                        continue;
                    };
                    match base.join(event.data.trim()) {
                        Ok(url) => {
                            let _ = tx.send(url);
                        }
                        Err(e) => tracing::warn!(error = %e, data = %event.data, "Invalid SSE endpoint"),
                    }
                }
                "message" => deliver(&pending, &event.data),
                other => tracing::debug!(event = other, "Ignoring SSE event"),
            }
        }
    }

    tracing::debug!("SSE stream ended");
    // Wake every waiter with a closed channel.
    let mut waiters = pending.lock().unwrap_or_else(PoisonError::into_inner);
    waiters.closed = true;
    waiters.senders.clear();
}

fn deliver(pending: &Pending, data: &str) {
    let response: JsonRpcResponse = match serde_json::from_str(data) {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "Skipping non-JSON-RPC SSE message");
            return;
        }
    };
    if response.method.is_some() {
        return;
    }
    let Some(id) = response.id else {
        return;
    };
    let waiter = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .senders
        .remove(&id);
    if let Some(tx) = waiter {
        let _ = tx.send(response);
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpClientError> {
        let id = request.id;
        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if waiters.closed {
                return Err(stream_closed());
            }
            waiters.senders.insert(id, tx);
        }

        if let Err(e) = self.post(&request).await {
            self.forget(id);
            return Err(e);
        }

        rx.await.map_err(|_| stream_closed())
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<(), McpClientError> {
        self.post(&notification).await
    }

    async fn close(&self) {
        self.reader.abort();
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
