use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::stream;
use serde_json::{Value, json};
use tokio::sync::{Mutex, oneshot};

#[derive(Debug, Clone)]
pub enum ProviderReply {
    Json { status: StatusCode, body: Value },
    EventStream(String),
    /// Sends these bytes, then fails the body so the connection drops mid-stream.
    AbortedStream(String),
}

impl ProviderReply {
    pub fn message(content: &str) -> Self {
        Self::Json {
            status: StatusCode::OK,
            body: json!({
                "id": "gen-integration",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": content}}
                ]
            }),
        }
    }

    /// One SSE event per delta, then the `[DONE]` marker.
    pub fn deltas(deltas: &[&str]) -> Self {
        let mut body = String::from(": OPENROUTER PROCESSING\n\n");
        for delta in deltas {
            let event = json!({"choices": [{"index": 0, "delta": {"content": delta}}]});
            body.push_str(&format!("data: {event}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        Self::EventStream(body)
    }

    pub fn aborted_after(delta: &str) -> Self {
        let event = json!({"choices": [{"index": 0, "delta": {"content": delta}}]});
        Self::AbortedStream(format!("data: {event}\n\n"))
    }

    pub fn failure(status: StatusCode) -> Self {
        Self::Json {
            status,
            body: json!({"error": {"code": status.as_u16(), "message": "provider failure"}}),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ProviderState {
    replies: Arc<Mutex<VecDeque<ProviderReply>>>,
    seen_bodies: Arc<Mutex<Vec<Value>>>,
    seen_headers: Arc<Mutex<Vec<HeaderMap>>>,
}

/// Stand-in for the OpenRouter chat completions endpoint.
pub struct ProviderMock {
    pub url: String,
    state: ProviderState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_task: Option<tokio::task::JoinHandle<()>>,
}

impl ProviderMock {
    pub async fn start(replies: Vec<ProviderReply>) -> Self {
        let state = ProviderState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Default::default()
        };
        let app = Router::new()
            .route("/chat/completions", post(chat_completions_handler))
            .with_state(state.clone());

        let (base_url, shutdown_tx, server_task) = super::serve(app).await;
        Self {
            url: format!("{base_url}/chat/completions"),
            state,
            shutdown_tx: Some(shutdown_tx),
            server_task: Some(server_task),
        }
    }

    pub async fn seen_bodies(&self) -> Vec<Value> {
        self.state.seen_bodies.lock().await.clone()
    }

    pub async fn seen_headers(&self) -> Vec<HeaderMap> {
        self.state.seen_headers.lock().await.clone()
    }

    pub async fn stop(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(server_task) = self.server_task.take() {
            server_task.await.expect("provider task should join");
        }
    }
}

async fn chat_completions_handler(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    state.seen_bodies.lock().await.push(payload);
    state.seen_headers.lock().await.push(headers);

    let reply = state
        .replies
        .lock()
        .await
        .pop_front()
        .unwrap_or(ProviderReply::failure(StatusCode::INTERNAL_SERVER_ERROR));

    match reply {
        ProviderReply::Json { status, body } => (status, Json(body)).into_response(),
        ProviderReply::EventStream(body) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "text/event-stream")
            .body(Body::from(body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        ProviderReply::AbortedStream(prefix) => {
            let chunks: Vec<Result<Bytes, io::Error>> = vec![
                Ok(Bytes::from(prefix)),
                Err(io::Error::other("provider connection reset")),
            ];
            Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "text/event-stream")
                .body(Body::from_stream(stream::iter(chunks)))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
