//! Queue services: issuance, dispatch, lifecycle and read models.
//!
//! Services validate input, consult the stores and the schedule oracle,
//! and hand back [`Outcome`]s or [`ServiceError`]s. Storage faults never
//! cross this boundary raw: they are logged and reported as
//! [`ErrorKind::Internal`].

mod context;
mod dispatch;
mod display;
mod hours;
mod issuance;
mod lifecycle;
mod outcome;

pub use context::QueueContext;
pub use dispatch::DispatchService;
pub use display::{
    CalledEntry, DisplayBoard, DisplayService, KioskCatalog, KioskCategory, KioskService,
    OfficeStatus, WaitingEntry,
};
pub use issuance::{normalize_phone, IssuanceService, IssueTicketRequest};
pub use lifecycle::LifecycleService;
pub use outcome::{ErrorKind, Info, InfoKind, Outcome, ServiceError, ServiceResult};
