//! Results handed to callers of the queue services.
//!
//! Every operation returns `Result<Outcome<T>, ServiceError>` or a plain
//! `Result<T, ServiceError>` when it has no informational outcome.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::sequence::SequenceError;
use crate::ticket::TransitionError;

const INTERNAL_PUBLIC_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Failure categories visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing service, office, ticket, operator or service point.
    NotFound,
    /// Missing or malformed parameters.
    InvalidInput,
    /// Wrong status for the action, wrong operator, no skills.
    PreconditionFailed,
    /// The daily counter could not be claimed within the retry bound.
    ConflictRetryExhausted,
    /// No schedule is resolvable for the office.
    ConfigurationError,
    /// Storage or other unexpected fault. Details are logged, never shown.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::ConflictRetryExhausted => "conflict_retry_exhausted",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure returned by a service operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationError, message)
    }

    /// Message safe to show to an untrusted caller.
    pub fn public_message(&self) -> &str {
        match self.kind {
            ErrorKind::Internal => INTERNAL_PUBLIC_MESSAGE,
            _ => &self.message,
        }
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        ServiceError::precondition_failed(err.to_string())
    }
}

impl From<SequenceError> for ServiceError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::Exhausted { .. } => {
                ServiceError::new(ErrorKind::ConflictRetryExhausted, err.to_string())
            }
            other => {
                error!(error = %other, "Sequence counter fault");
                ServiceError::new(ErrorKind::Internal, other.to_string())
            }
        }
    }
}

/// Logs unexpected faults with their context and turns them into `Internal`.
pub(crate) trait InternalContext<T> {
    fn internal(self, operation: &'static str, entity_id: &str) -> Result<T, ServiceError>;
}

impl<T, E: fmt::Display> InternalContext<T> for Result<T, E> {
    fn internal(self, operation: &'static str, entity_id: &str) -> Result<T, ServiceError> {
        self.map_err(|e| {
            error!(operation, entity_id, error = %e, "Internal fault");
            ServiceError::new(
                ErrorKind::Internal,
                format!("{} failed for {}: {}", operation, entity_id, e),
            )
        })
    }
}

/// Non-error outcomes callers must present differently from failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoKind {
    OfficeClosed,
    NoTicketAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Info {
    pub kind: InfoKind,
    pub message: String,
}

impl Info {
    pub fn office_closed() -> Self {
        Self {
            kind: InfoKind::OfficeClosed,
            message: "The office is currently closed.".to_string(),
        }
    }

    pub fn no_ticket_available() -> Self {
        Self {
            kind: InfoKind::NoTicketAvailable,
            message: "No tickets are waiting for your services.".to_string(),
        }
    }
}

/// Success, or an informational result that is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Info(Info),
}

impl<T> Outcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Info(_) => None,
        }
    }

    pub fn info(&self) -> Option<&Info> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Info(info) => Some(info),
        }
    }

    pub fn is_info(&self, kind: InfoKind) -> bool {
        self.info().is_some_and(|info| info.kind == kind)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::Info(info) => Outcome::Info(info),
        }
    }
}

pub type ServiceResult<T> = Result<Outcome<T>, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_internal_message_is_hidden() {
        let err: Result<(), _> = Err("disk I/O error at page 7");
        let err = err.internal("issue_ticket", "office-1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("disk I/O"));
        assert!(!err.public_message().contains("disk"));
    }

    #[test]
    fn test_non_internal_message_is_public() {
        let err = ServiceError::not_found("Service not found: svc-9");
        assert_eq!(err.public_message(), "Service not found: svc-9");
    }

    #[test]
    fn test_exhausted_sequence_maps_to_its_own_kind() {
        let err: ServiceError = SequenceError::Exhausted {
            office_id: "o1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            attempts: 5,
        }
        .into();
        assert_eq!(err.kind, ErrorKind::ConflictRetryExhausted);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: Outcome<u32> = Outcome::Ok(3);
        assert_eq!(ok.clone().map(|v| v * 2).ok(), Some(6));
        assert!(ok.info().is_none());

        let closed: Outcome<u32> = Outcome::Info(Info::office_closed());
        assert!(closed.is_info(InfoKind::OfficeClosed));
        assert!(!closed.is_info(InfoKind::NoTicketAvailable));
        assert_eq!(closed.ok(), None);
    }
}
