use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::llm::CompletionGateway;

mod chat;
mod errors;
mod health;
mod observability;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn CompletionGateway>,
    /// Response mode when the caller does not pass `?stream=`.
    pub stream_by_default: bool,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/chat", post(chat::relay_chat))
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
        .with_state(app_state)
}
