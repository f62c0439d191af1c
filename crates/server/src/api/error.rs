//! Mapping of service errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cherga_core::{ErrorKind, ServiceError};
use serde::Serialize;

/// Message shown to kiosk visitors for any server-side problem.
const KIOSK_UNAVAILABLE: &str = "Ticket issuance is temporarily unavailable.";

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// A service error ready to be sent over HTTP.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Like `From<ServiceError>`, but hides server-side detail from visitors.
    pub fn for_kiosk(err: ServiceError) -> Self {
        let status = status_for(err.kind);
        let error = if status.is_server_error() {
            KIOSK_UNAVAILABLE.to_string()
        } else {
            err.public_message().to_string()
        };
        Self {
            status,
            body: ErrorResponse {
                error,
                kind: err.kind,
            },
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::PreconditionFailed => StatusCode::CONFLICT,
        ErrorKind::ConflictRetryExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ConfigurationError | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self {
            status: status_for(err.kind),
            body: ErrorResponse {
                error: err.public_message().to_string(),
                kind: err.kind,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
