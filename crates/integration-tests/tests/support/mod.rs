#![allow(dead_code)]

pub mod provider_mock;

use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::config::ProviderConfig;
use shared::llm::OpenRouterGateway;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const TEST_API_KEY: &str = "integration-openrouter-key";
pub const TEST_MODEL: &str = "integration-model";

/// A relay bound to an ephemeral port, forwarding to the given provider url.
pub struct TestRelay {
    pub chat_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_task: Option<tokio::task::JoinHandle<()>>,
}

impl TestRelay {
    pub async fn start(provider_url: &str, stream_by_default: bool) -> Self {
        let gateway =
            OpenRouterGateway::new(provider_config(provider_url)).expect("gateway should build");
        let app = relay_router(gateway, stream_by_default);

        let (base_url, shutdown_tx, server_task) = serve(app).await;
        Self {
            chat_url: format!("{base_url}/api/chat"),
            shutdown_tx: Some(shutdown_tx),
            server_task: Some(server_task),
        }
    }

    pub async fn stop(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(server_task) = self.server_task.take() {
            server_task.await.expect("relay task should join");
        }
    }
}

pub fn relay_router(gateway: OpenRouterGateway, stream_by_default: bool) -> axum::Router {
    build_router(AppState {
        gateway: Arc::new(gateway),
        stream_by_default,
    })
}

pub fn provider_config(chat_completions_url: &str) -> ProviderConfig {
    ProviderConfig {
        chat_completions_url: chat_completions_url.to_string(),
        api_key: TEST_API_KEY.to_string(),
        model: TEST_MODEL.to_string(),
        timeout_ms: Some(5_000),
        site_url: Some("https://matherbot.test".to_string()),
        site_name: Some("MatherBot".to_string()),
    }
}

pub async fn serve(
    app: axum::Router,
) -> (String, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let local_addr = listener
        .local_addr()
        .expect("listener address should resolve");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        server.await.expect("test server should run");
    });

    (format!("http://{local_addr}"), shutdown_tx, server_task)
}
