use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

pub type CompletionFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Raw upstream body, chunk by chunk, in arrival order.
pub type CompletionStream = BoxStream<'static, Result<Bytes, GatewayError>>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("completion provider unavailable: {0}")]
    Unavailable(String),
    #[error("completion provider returned status {status}")]
    UpstreamStatus { status: u16 },
    #[error("completion provider returned an invalid payload: {0}")]
    InvalidPayload(String),
    #[error("completion stream read failed: {0}")]
    StreamRead(String),
}

/// One outbound provider call per invocation; the system prompt is added by
/// the implementation.
pub trait CompletionGateway: Send + Sync {
    fn complete<'a>(&'a self, turns: Vec<Value>) -> CompletionFuture<'a, Value>;

    fn stream<'a>(&'a self, turns: Vec<Value>) -> CompletionFuture<'a, CompletionStream>;
}
