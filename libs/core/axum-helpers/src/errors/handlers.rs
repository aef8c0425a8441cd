use axum::{http::StatusCode, response::Response};

use super::{ErrorCode, error_response};

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorCode::NotFound.default_message().to_string(),
        ErrorCode::NotFound,
    )
}

/// Method fallback for routes, e.g. `get(handler).fallback(method_not_allowed)`.
pub async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::MethodNotAllowed.default_message().to_string(),
        ErrorCode::MethodNotAllowed,
    )
}

/// Maps errors raised by middleware (currently only the request timeout) to the
/// standard envelope.
pub async fn handle_middleware_error(err: tower::BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!(
            error_code = ErrorCode::RequestTimeout.code(),
            "Request exceeded time budget"
        );
        return error_response(
            StatusCode::REQUEST_TIMEOUT,
            ErrorCode::RequestTimeout.default_message().to_string(),
            ErrorCode::RequestTimeout,
        );
    }

    tracing::error!(error = %err, "Unhandled middleware error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalError.default_message().to_string(),
        ErrorCode::InternalError,
    )
}
