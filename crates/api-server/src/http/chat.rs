use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use shared::llm::{CompletionStream, GatewayError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use super::AppState;
use super::errors::upstream_error_response;
use super::observability::RequestContext;

/// Upstream chunks held for a slow client before the forwarder stops reading.
const STREAM_BUFFER_CHUNKS: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub(super) struct RelayQuery {
    #[serde(default)]
    stream: Option<bool>,
}

/// Forwards the caller's turns to the provider behind the fixed system prompt.
/// Turns are not validated; whatever the caller sent is what the provider sees.
pub(super) async fn relay_chat(
    State(state): State<AppState>,
    Extension(request_context): Extension<RequestContext>,
    Query(query): Query<RelayQuery>,
    Json(turns): Json<Vec<Value>>,
) -> Response {
    let stream = query.stream.unwrap_or(state.stream_by_default);
    info!(
        request_id = %request_context.request_id,
        turn_count = turns.len(),
        stream,
        "relaying chat turns to completion provider"
    );

    if stream {
        relay_stream(&state, turns, &request_context.request_id).await
    } else {
        relay_batch(&state, turns, &request_context.request_id).await
    }
}

async fn relay_batch(state: &AppState, turns: Vec<Value>, request_id: &str) -> Response {
    match state.gateway.complete(turns).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => upstream_error_response(&err, request_id),
    }
}

async fn relay_stream(state: &AppState, turns: Vec<Value>, request_id: &str) -> Response {
    let upstream = match state.gateway.stream(turns).await {
        Ok(upstream) => upstream,
        Err(err) => return upstream_error_response(&err, request_id),
    };

    let (tx, rx) = mpsc::channel::<Result<Bytes, GatewayError>>(STREAM_BUFFER_CHUNKS);
    tokio::spawn(forward_stream(upstream, tx, request_id.to_string()));

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// Copies upstream chunks to the response body unchanged. A read failure is
/// passed on as an error item, which aborts the response body. Reading pauses
/// while the channel is full.
async fn forward_stream(
    mut upstream: CompletionStream,
    tx: mpsc::Sender<Result<Bytes, GatewayError>>,
    request_id: String,
) {
    let mut relayed_bytes = 0_usize;
    while let Some(chunk) = upstream.next().await {
        match chunk {
            Ok(bytes) => {
                relayed_bytes += bytes.len();
                if tx.send(Ok(bytes)).await.is_err() {
                    debug!(request_id = %request_id, relayed_bytes, "client went away mid-stream");
                    return;
                }
            }
            Err(err) => {
                error!(
                    request_id = %request_id,
                    relayed_bytes,
                    error = %err,
                    "completion stream aborted"
                );
                let _ = tx.send(Err(err)).await;
                return;
            }
        }
    }

    debug!(request_id = %request_id, relayed_bytes, "completion stream finished");
}
