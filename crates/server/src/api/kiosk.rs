//! Kiosk endpoints: the service catalog and walk-in ticket issuance.
//!
//! Visitors see sanitized errors only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use cherga_core::{
    service::{Info, IssueTicketRequest, KioskCatalog},
    Outcome, Ticket,
};

use super::error::ApiError;
use crate::state::AppState;

/// What the kiosk prints on a freshly issued ticket.
#[derive(Debug, Serialize)]
pub struct IssuedTicket {
    pub id: String,
    pub number: String,
    pub short_number: String,
    pub office_id: String,
    pub service_id: String,
    pub issue_time: DateTime<Utc>,
}

impl From<&Ticket> for IssuedTicket {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            number: ticket.number.clone(),
            short_number: ticket.short_number().to_string(),
            office_id: ticket.office_id.clone(),
            service_id: ticket.service_id.clone(),
            issue_time: ticket.issue_time,
        }
    }
}

/// Response for an issuance request
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueResponse {
    Issued { ticket: IssuedTicket },
    Closed { message: String },
}

/// Issue a walk-in ticket
pub async fn issue_ticket(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IssueTicketRequest>,
) -> Result<Response, ApiError> {
    match state
        .issuance()
        .issue_ticket(&request)
        .await
        .map_err(ApiError::for_kiosk)?
    {
        Outcome::Ok(ticket) => Ok((
            StatusCode::CREATED,
            Json(IssueResponse::Issued {
                ticket: IssuedTicket::from(&ticket),
            }),
        )
            .into_response()),
        Outcome::Info(Info { message, .. }) => {
            debug!(office_id = %request.office_id, "Kiosk issuance while closed");
            Ok((StatusCode::OK, Json(IssueResponse::Closed { message })).into_response())
        }
    }
}

/// Services the kiosk may offer right now
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(office_id): Path<String>,
) -> Result<Json<KioskCatalog>, ApiError> {
    state
        .display()
        .kiosk_services(&office_id)
        .await
        .map(Json)
        .map_err(ApiError::for_kiosk)
}
