//! Mapping of library errors onto HTTP responses.
//!
//! - `InvalidRequest`, `InvalidLength`, `InvalidHex` → `400 Bad Request`
//! - `Interrupted` → `503 Service Unavailable`
//! - `JobFailed`, `Write` → `500 Internal Server Error`
//!
//! The body is the error's display text. Callers learn that the job failed
//! and whether partial writes were kept, not which batches failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oidbulk::Error;

/// An [`oidbulk::Error`] on its way to an HTTP client.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self(Error::InvalidRequest {
            reason: reason.into(),
        })
    }

    pub const fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidRequest { .. } | Error::InvalidLength { .. } | Error::InvalidHex { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Interrupted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::JobFailed { .. } | Error::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.0.to_string()).into_response()
    }
}
