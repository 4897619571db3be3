use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::config::{RelayConfig, load_dotenv};
use shared::llm::OpenRouterGateway;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=info,shared=info".to_string()),
        )
        .init();

    let config = match RelayConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let gateway = match OpenRouterGateway::new(config.provider.clone()) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!("failed to build completion gateway: {err}");
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!(bind_addr = %config.bind_addr, "invalid RELAY_BIND_ADDR: {err}");
            std::process::exit(1);
        }
    };

    info!(
        model = %gateway.model(),
        stream_by_default = config.stream_by_default,
        "relay configured"
    );

    let app = build_router(AppState {
        gateway: Arc::new(gateway),
        stream_by_default: config.stream_by_default,
    });

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "relay listening on {}",
        listener.local_addr().unwrap_or(addr)
    );
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("relay server stopped: {err}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
