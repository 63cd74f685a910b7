//! In-process stand-in for the inventory REST backend.
//!
//! Every request is recorded; responses come from a table keyed by method and
//! path, so a test scripts exactly the endpoints it exercises. Unscripted
//! routes answer 404 with an `{"error": ...}` body.

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use crate::backend::{BackendConfig, HttpBackend};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    content_type: &'static str,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MockState {
    routes: Arc<Mutex<HashMap<(Method, String), Scripted>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Clone)]
pub struct MockBackend {
    pub url: String,
    state: MockState,
}

impl MockBackend {
    pub async fn spawn() -> Result<Self> {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = MockState::default();
        let app = Router::new()
            .fallback(dispatch)
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            url: format!("http://{addr}"),
            state,
        })
    }

    pub fn http_backend(&self) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: self.url.clone(),
            request_timeout: Duration::from_secs(5),
        })
        .expect("http backend")
    }

    pub async fn json(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.script(method, path, status, body.to_string(), "application/json", None)
            .await;
    }

    pub async fn text(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.script(method, path, status, body.to_string(), "text/plain", None)
            .await;
    }

    pub async fn delayed_json(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        body: Value,
    ) {
        self.script(
            method,
            path,
            StatusCode::OK,
            body.to_string(),
            "application/json",
            Some(delay),
        )
        .await;
    }

    async fn script(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: String,
        content_type: &'static str,
        delay: Option<Duration>,
    ) {
        self.state.routes.lock().await.insert(
            (method, path.to_string()),
            Scripted {
                status,
                body,
                content_type,
                delay,
            },
        );
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }

    pub async fn hits(&self, method: Method, path: &str) -> usize {
        self.state
            .requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub async fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.state
            .requests
            .lock()
            .await
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .and_then(|r| r.body.clone())
    }
}

async fn dispatch(
    axum::extract::State(state): axum::extract::State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).ok(),
    });

    let scripted = state.routes.lock().await.get(&(method, path.clone())).cloned();
    let scripted = scripted.unwrap_or_else(|| Scripted {
        status: StatusCode::NOT_FOUND,
        body: json!({ "error": format!("no route for {path}") }).to_string(),
        content_type: "application/json",
        delay: None,
    });
    if let Some(delay) = scripted.delay {
        tokio::time::sleep(delay).await;
    }

    Response::builder()
        .status(scripted.status)
        .header(header::CONTENT_TYPE, scripted.content_type)
        .body(Body::from(scripted.body))
        .expect("mock response")
}

pub fn user_json(id: i64, name: &str, email: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "phoneNumber": "555-0100",
        "role": role,
        "passwordHash": "$2a$10$not-for-the-client"
    })
}
