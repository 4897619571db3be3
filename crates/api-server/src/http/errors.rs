use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::GatewayError;
use shared::models::{ErrorBody, ErrorResponse};
use tracing::error;

pub(super) fn bad_gateway_response(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}

/// Every provider failure looks the same to the caller.
pub(super) fn upstream_error_response(err: &GatewayError, request_id: &str) -> Response {
    error!(request_id = %request_id, error = %err, "completion provider request failed");
    bad_gateway_response(
        "upstream_unavailable",
        "The completion provider could not be reached",
    )
}
