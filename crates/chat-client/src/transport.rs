use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use shared::llm::{SseDecoder, extract_message_content};
use shared::models::Turn;
use thiserror::Error;
use tracing::debug;

pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Callback fed with each decoded piece of a streamed reply, in arrival order.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(&str) + Send);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build relay http client: {0}")]
    HttpClient(String),
    #[error("relay request failed: {0}")]
    Request(String),
    #[error("relay returned status {status}")]
    Status { status: u16 },
    #[error("relay returned an invalid payload: {0}")]
    InvalidPayload(String),
    #[error("relay response had no message content")]
    MissingContent,
    #[error("relay stream read failed: {0}")]
    StreamRead(String),
}

/// How the widget reaches the model. The history is every turn up to and
/// including the new user turn; the empty placeholder is never sent.
pub trait ChatTransport: Send + Sync {
    fn fetch_reply<'a>(&'a self, history: &'a [Turn]) -> TransportFuture<'a, String>;

    fn stream_reply<'a>(
        &'a self,
        history: &'a [Turn],
        on_chunk: ChunkSink<'a>,
    ) -> TransportFuture<'a, ()>;
}

/// Talks to the relay endpoint over HTTP.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    relay_url: String,
}

impl RelayClient {
    /// No timeout is applied unless `connect_timeout_ms` is set.
    pub fn new(
        relay_url: impl Into<String>,
        connect_timeout_ms: Option<u64>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    async fn post_history(
        &self,
        history: &[Turn],
        stream: bool,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(&self.relay_url)
            .query(&[("stream", stream)])
            .json(history)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl ChatTransport for RelayClient {
    fn fetch_reply<'a>(&'a self, history: &'a [Turn]) -> TransportFuture<'a, String> {
        Box::pin(async move {
            let response = self.post_history(history, false).await?;
            let body = response
                .json::<Value>()
                .await
                .map_err(|err| TransportError::InvalidPayload(err.to_string()))?;

            extract_message_content(&body).ok_or(TransportError::MissingContent)
        })
    }

    fn stream_reply<'a>(
        &'a self,
        history: &'a [Turn],
        on_chunk: ChunkSink<'a>,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let response = self.post_history(history, true).await?;
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut chunk_count = 0_usize;

            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|err| TransportError::StreamRead(err.to_string()))?;
                for delta in decoder.push(&chunk) {
                    chunk_count += 1;
                    on_chunk(&delta);
                }
            }
            for delta in decoder.finish() {
                chunk_count += 1;
                on_chunk(&delta);
            }

            debug!(chunk_count, done_marker = decoder.is_done(), "relay stream closed");
            Ok(())
        })
    }
}
