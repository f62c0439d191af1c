//! Read-only directory of reference data.

use thiserror::Error;

use super::{Office, OfficeService, Operator, Organization, Service, ServiceCategory, ServicePoint};
use crate::schedule::Schedule;

/// Error type for directory lookups.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("Invalid stored data for {entity} {id}: {reason}")]
    InvalidData {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

/// Lookups over organizations, offices, services, points, operators and schedules.
pub trait Directory: Send + Sync {
    fn organization(&self, id: &str) -> Result<Option<Organization>, DirectoryError>;

    fn office(&self, id: &str) -> Result<Option<Office>, DirectoryError>;

    fn service(&self, id: &str) -> Result<Option<Service>, DirectoryError>;

    /// Service assignments of an office, in assignment order.
    fn office_services(&self, office_id: &str) -> Result<Vec<OfficeService>, DirectoryError>;

    fn service_categories(&self) -> Result<Vec<ServiceCategory>, DirectoryError>;

    fn service_point(&self, id: &str) -> Result<Option<ServicePoint>, DirectoryError>;

    fn operator(&self, id: &str) -> Result<Option<Operator>, DirectoryError>;

    /// The active operator linked to a user identity.
    fn active_operator_for_user(&self, user_id: &str) -> Result<Option<Operator>, DirectoryError>;

    fn schedule(&self, id: &str) -> Result<Option<Schedule>, DirectoryError>;
}
