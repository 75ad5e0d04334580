//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use homerc_domain::error::RcError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`RcError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(RcError);

impl From<RcError> for ApiError {
    fn from(err: RcError) -> Self {
        Self(err)
    }
}

impl From<homerc_domain::error::ValidationError> for ApiError {
    fn from(err: homerc_domain::error::ValidationError) -> Self {
        Self(RcError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RcError::UnknownResource { .. }
            | RcError::UnknownHost { .. }
            | RcError::UnknownDriver { .. } => StatusCode::NOT_FOUND,
            RcError::Validation(_) | RcError::TypeMismatch { .. } => StatusCode::BAD_REQUEST,
            RcError::NotWritable { .. } => StatusCode::FORBIDDEN,
            RcError::DuplicateId { .. } => StatusCode::CONFLICT,
        };
        let message = match &self.0 {
            RcError::Validation(err) => err.to_string(),
            other => other.to_string(),
        };
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %message, "malformed request rejected");
        } else {
            tracing::debug!(%status, error = %message, "request rejected");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
