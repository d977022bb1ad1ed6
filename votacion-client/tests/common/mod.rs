//! Scriptable stand-in for the survey backend.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use client::{App, storage::KeyValueStorage};
use serde_json::{Value, json};
use shared::config::Config;
use tokio::{net::TcpListener, task::JoinHandle};
use url::Url;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: Value,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Script {
    replies: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<Recorded>>,
}

#[derive(Debug)]
pub struct MockBackend {
    pub url: Url,
    script: Arc<Script>,
    server: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let script = Arc::new(Script::default());
        let app = Router::new().fallback(handle).with_state(script.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            script,
            server,
        }
    }

    /// Answers every `method path` request with `status` and `body` until
    /// scripted again.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.script_reply(method, path, status, body, None);
    }

    /// Like [`respond`](Self::respond), holding the answer back for `delay`.
    pub fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: StatusCode,
        body: Value,
    ) {
        self.script_reply(method, path, status, body, Some(delay));
    }

    pub fn succeed(&self, method: Method, path: &str, data: Value) {
        self.respond(
            method,
            path,
            StatusCode::OK,
            json!({"status": "success", "data": data}),
        );
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| &r.method == method && r.path == path)
            .collect()
    }

    /// Client configuration pointed at this backend.
    pub fn config(&self) -> Config {
        let mut config = Config::with_defaults();
        config.api_root = self.url.clone();
        config.timeout_ms = 2_000;
        config
    }

    pub fn app(&self, storage: Arc<dyn KeyValueStorage>) -> App {
        App::with_storage(self.config(), storage).unwrap()
    }

    fn script_reply(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        body: Value,
        delay: Option<Duration>,
    ) {
        self.script.replies.lock().unwrap().insert(
            (method, path.to_string()),
            Reply {
                status,
                body,
                delay,
            },
        );
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn handle(
    State(script): State<Arc<Script>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    script.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let reply = script
        .replies
        .lock()
        .unwrap()
        .get(&(method, path))
        .cloned();
    match reply {
        Some(reply) => {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            (reply.status, axum::Json(reply.body)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"status": "error", "message": "not found"})),
        )
            .into_response(),
    }
}
