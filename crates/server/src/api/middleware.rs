//! Metrics middleware and the operator identity extractor.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use cherga_core::ServiceError;
use std::future::Future;
use std::time::Instant;

use super::error::ApiError;
use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
    MISSING_OPERATOR_TOTAL,
};

/// Header carrying the authenticated user id, set by the fronting auth proxy.
pub const OPERATOR_USER_HEADER: &str = "x-operator-user";

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// This middleware records:
/// - Request duration (histogram)
/// - Request count (counter)
/// - Requests in flight (gauge)
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Extractor for the acting operator's user id.
///
/// Identity is taken on trust from [`OPERATOR_USER_HEADER`]; a missing or
/// blank header is rejected with 400.
#[derive(Debug, Clone)]
pub struct OperatorUser(pub String);

impl<S> FromRequestParts<S> for OperatorUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = match parts.headers.get(OPERATOR_USER_HEADER) {
            None => {
                MISSING_OPERATOR_TOTAL.with_label_values(&["missing"]).inc();
                Err(ServiceError::invalid_input("Operator identity is required").into())
            }
            Some(value) => match value.to_str().map(str::trim) {
                Ok(user) if !user.is_empty() => Ok(OperatorUser(user.to_string())),
                _ => {
                    MISSING_OPERATOR_TOTAL.with_label_values(&["invalid"]).inc();
                    Err(ServiceError::invalid_input("Operator identity header is invalid").into())
                }
            },
        };
        std::future::ready(result)
    }
}
