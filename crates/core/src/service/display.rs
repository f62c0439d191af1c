//! Read models for the display board, the kiosk and queue statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::QueueContext;
use super::hours::Gate;
use super::outcome::{InternalContext, ServiceError};
use crate::config::DisplayConfig;
use crate::directory::{Office, Service};
use crate::events::QueueStats;
use crate::ticket::{TicketFilter, TicketOrder, TicketStatus};

const CLOSED_MESSAGE: &str = "The office is currently closed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeStatus {
    Open,
    Closed,
}

/// A recently called ticket as shown on the hall display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalledEntry {
    pub ticket_id: String,
    pub short_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_point_name: Option<String>,
    /// Office-local `HH:MM` of the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_time: Option<String>,
}

/// A waiting ticket as shown on the hall display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitingEntry {
    pub ticket_id: String,
    pub short_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayBoard {
    pub office_id: String,
    pub office_name: String,
    pub office_status: OfficeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_called: Vec<CalledEntry>,
    pub waiting: Vec<WaitingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KioskService {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KioskCategory {
    pub id: String,
    pub name: String,
    pub services: Vec<KioskService>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KioskCatalog {
    pub office_id: String,
    pub office_name: String,
    pub status: OfficeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub categories: Vec<KioskCategory>,
    pub uncategorized: Vec<KioskService>,
}

/// Office-scoped read models.
#[derive(Clone)]
pub struct DisplayService {
    ctx: QueueContext,
    limit_called: usize,
    limit_waiting: usize,
}

impl DisplayService {
    pub fn new(ctx: QueueContext, config: &DisplayConfig) -> Self {
        Self {
            ctx,
            limit_called: config.limit_called,
            limit_waiting: config.limit_waiting,
        }
    }

    fn is_open(&self, office: &Office, now: DateTime<Utc>) -> bool {
        self.ctx.gate(office, now) == Gate::Open
    }

    /// Hall display data: recent calls and the head of the queue for today.
    pub async fn display_board(&self, office_id: &str) -> Result<DisplayBoard, ServiceError> {
        let office = self.ctx.office(office_id.trim())?;
        let now = self.ctx.clock.now();

        let mut board = DisplayBoard {
            office_id: office.id.clone(),
            office_name: office.name.clone(),
            office_status: OfficeStatus::Closed,
            message: Some(CLOSED_MESSAGE.to_string()),
            last_called: Vec::new(),
            waiting: Vec::new(),
        };
        if !self.is_open(&office, now) {
            return Ok(board);
        }

        let tz = self.ctx.oracle.resolve_zone(office.timezone.as_deref());
        let day_start = self.ctx.local_day_start(&office, now);

        let called = self
            .ctx
            .tickets
            .list(
                &TicketFilter::new()
                    .with_office(&office.id)
                    .with_status(TicketStatus::Called)
                    .issued_since(day_start)
                    .with_order(TicketOrder::LatestActivity)
                    .with_limit(self.limit_called as i64),
            )
            .internal("list_called", &office.id)?;

        let waiting = self
            .ctx
            .tickets
            .list(
                &TicketFilter::new()
                    .with_office(&office.id)
                    .with_status(TicketStatus::Waiting)
                    .issued_since(day_start)
                    .with_order(TicketOrder::Queue)
                    .with_limit(self.limit_waiting as i64),
            )
            .internal("list_waiting", &office.id)?;

        board.office_status = OfficeStatus::Open;
        board.message = None;
        board.last_called = called
            .iter()
            .map(|ticket| {
                let view = self.ctx.view(ticket);
                CalledEntry {
                    ticket_id: view.id,
                    short_number: view.short_number,
                    service_point_name: view.service_point_name,
                    call_time: ticket
                        .call_time
                        .map(|t| t.with_timezone(&tz).format("%H:%M").to_string()),
                }
            })
            .collect();

        let mut service_names: HashMap<String, Option<String>> = HashMap::new();
        board.waiting = waiting
            .iter()
            .map(|ticket| {
                let service_name = service_names
                    .entry(ticket.service_id.clone())
                    .or_insert_with(|| self.ctx.view(ticket).service_name)
                    .clone();
                WaitingEntry {
                    ticket_id: ticket.id.clone(),
                    short_number: ticket.short_number().to_string(),
                    service_name,
                }
            })
            .collect();

        Ok(board)
    }

    /// Services a kiosk may offer right now, grouped by category.
    pub async fn kiosk_services(&self, office_id: &str) -> Result<KioskCatalog, ServiceError> {
        let office = self.ctx.office(office_id.trim())?;
        let now = self.ctx.clock.now();

        let mut catalog = KioskCatalog {
            office_id: office.id.clone(),
            office_name: office.name.clone(),
            status: OfficeStatus::Closed,
            message: Some(CLOSED_MESSAGE.to_string()),
            categories: Vec::new(),
            uncategorized: Vec::new(),
        };
        if !self.is_open(&office, now) {
            return Ok(catalog);
        }

        let assignments = self
            .ctx
            .directory
            .office_services(&office.id)
            .internal("load_office_services", &office.id)?;

        let mut services: Vec<Service> = Vec::new();
        for assignment in assignments.iter().filter(|a| a.is_active) {
            let service = self
                .ctx
                .directory
                .service(&assignment.service_id)
                .internal("load_service", &assignment.service_id)?;
            match service {
                Some(s) if s.enabled && s.live_queue_enabled => {
                    if !services.iter().any(|known| known.id == s.id) {
                        services.push(s);
                    }
                }
                _ => {}
            }
        }

        let categories = self
            .ctx
            .directory
            .service_categories()
            .internal("load_service_categories", &office.id)?;

        let to_entry = |s: &Service| KioskService {
            id: s.id.clone(),
            name: s.name.clone(),
            icon: s.icon.clone(),
        };

        catalog.categories = categories
            .iter()
            .map(|category| KioskCategory {
                id: category.id.clone(),
                name: category.name.clone(),
                services: services
                    .iter()
                    .filter(|s| s.category_id.as_deref() == Some(category.id.as_str()))
                    .map(to_entry)
                    .collect(),
            })
            .filter(|category| !category.services.is_empty())
            .collect();

        catalog.uncategorized = services
            .iter()
            .filter(|s| match s.category_id.as_deref() {
                Some(id) => !categories.iter().any(|c| c.id == id),
                None => true,
            })
            .map(to_entry)
            .collect();

        catalog.status = OfficeStatus::Open;
        catalog.message = None;
        Ok(catalog)
    }

    /// Waiting count and tickets served today.
    pub async fn queue_stats(&self, office_id: &str) -> Result<QueueStats, ServiceError> {
        let office = self.ctx.office(office_id.trim())?;
        self.ctx.stats_for(&office, self.ctx.clock.now())
    }
}
