//! Ticket storage trait and query types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Ticket, TicketStatus};

/// Error type for ticket storage.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    /// A ticket with this id already exists.
    #[error("Ticket already exists: {0}")]
    Duplicate(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Sort order for ticket listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TicketOrder {
    /// Dispatch order: priority descending, then oldest issue first.
    #[default]
    Queue,
    /// Most recent call, start or completion first.
    LatestActivity,
    /// Most recently modified first.
    RecentlyUpdated,
}

/// Filter for querying tickets.
#[derive(Debug, Clone)]
pub struct TicketFilter {
    /// Filter by office.
    pub office_id: Option<String>,
    /// Any of these statuses (empty = any status).
    pub statuses: Vec<TicketStatus>,
    /// Any of these services (`None` = any service, empty = none).
    pub service_ids: Option<Vec<String>>,
    /// Filter by assigned operator.
    pub operator_id: Option<String>,
    /// Issued at or after this instant.
    pub issued_from: Option<DateTime<Utc>>,
    /// Completed at or after this instant.
    pub completed_from: Option<DateTime<Utc>>,
    pub order: TicketOrder,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            office_id: None,
            statuses: Vec::new(),
            service_ids: None,
            operator_id: None,
            issued_from: None,
            completed_from: None,
            order: TicketOrder::Queue,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by office.
    pub fn with_office(mut self, office_id: impl Into<String>) -> Self {
        self.office_id = Some(office_id.into());
        self
    }

    /// Filter by a single status.
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    /// Filter by any of several statuses.
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TicketStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restrict to a set of services.
    pub fn with_services(mut self, service_ids: impl IntoIterator<Item = String>) -> Self {
        self.service_ids = Some(service_ids.into_iter().collect());
        self
    }

    /// Filter by assigned operator.
    pub fn with_operator(mut self, operator_id: impl Into<String>) -> Self {
        self.operator_id = Some(operator_id.into());
        self
    }

    /// Only tickets issued at or after `from`.
    pub fn issued_since(mut self, from: DateTime<Utc>) -> Self {
        self.issued_from = Some(from);
        self
    }

    /// Only tickets completed at or after `from`.
    pub fn completed_since(mut self, from: DateTime<Utc>) -> Self {
        self.completed_from = Some(from);
        self
    }

    /// Set sort order.
    pub fn with_order(mut self, order: TicketOrder) -> Self {
        self.order = order;
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Returns true if `ticket` satisfies every condition of the filter.
    ///
    /// Ordering and pagination are not considered.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(ref office_id) = self.office_id {
            if &ticket.office_id != office_id {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&ticket.status) {
            return false;
        }
        if let Some(ref service_ids) = self.service_ids {
            if !service_ids.contains(&ticket.service_id) {
                return false;
            }
        }
        if let Some(ref operator_id) = self.operator_id {
            if ticket.operator_id.as_ref() != Some(operator_id) {
                return false;
            }
        }
        if let Some(from) = self.issued_from {
            if ticket.issue_time < from {
                return false;
            }
        }
        if let Some(from) = self.completed_from {
            match ticket.completion_time {
                Some(completed) if completed >= from => {}
                _ => return false,
            }
        }
        true
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// Insert a new ticket.
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError>;

    /// Get a ticket by ID.
    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError>;

    /// List tickets matching the filter, in the filter's order.
    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Count tickets matching the filter.
    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError>;

    /// Replace the stored ticket only if it is still at `expected_status` and
    /// `expected_version`.
    ///
    /// Returns false, and writes nothing, if the ticket was written since it
    /// was read or no longer exists.
    fn update_if_unchanged(
        &self,
        ticket: &Ticket,
        expected_status: TicketStatus,
        expected_version: i64,
    ) -> Result<bool, TicketError>;
}
