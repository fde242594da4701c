//! In-process HTTP stub for adapter tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

/// One request the stub received.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct StubState {
    routes: Arc<Mutex<HashMap<String, Vec<(StatusCode, Value)>>>>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// Answers canned JSON per path and records every request.
pub struct StubServer {
    pub base_url: String,
    state: StubState,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Queue a response for `path`. The last queued response repeats.
    pub fn respond(&self, path: &str, status: StatusCode, body: Value) -> &Self {
        self.state
            .routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push((status, body));
        self
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.captured.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Captured {
        self.requests().pop().expect("stub received no requests")
    }
}

async fn handle(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    state.captured.lock().unwrap().push(Captured {
        method,
        path: path.clone(),
        query: uri.query().map(ToString::to_string),
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let mut routes = state.routes.lock().unwrap();
    let Some(queue) = routes.get_mut(&path) else {
        return (StatusCode::NOT_FOUND, "no stub for path").into_response();
    };
    let (status, body) = if queue.len() > 1 {
        queue.remove(0)
    } else {
        queue[0].clone()
    };
    drop(routes);
    (status, axum::Json(body)).into_response()
}
