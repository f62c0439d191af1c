//! Organizations, offices, services, service points, operators and schedules.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteDirectory;
pub use store::{Directory, DirectoryError};
pub use types::{
    Office, OfficeService, Operator, Organization, Service, ServiceCategory, ServicePoint,
};
