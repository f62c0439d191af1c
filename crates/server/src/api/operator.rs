//! Operator endpoints: call-next, lifecycle actions and own-ticket views.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use cherga_core::{
    events::TicketView,
    service::{Info, InfoKind},
    Outcome,
};

use super::error::ApiError;
use super::middleware::OperatorUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body naming the operator's service point
#[derive(Debug, Deserialize)]
pub struct ServicePointBody {
    #[serde(default)]
    pub service_point_id: String,
}

/// Response for call-next
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallNextResponse {
    Called { ticket: TicketView },
    Info { kind: InfoKind, message: String },
}

/// Response for operator ticket lists
#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketView>,
    pub total: usize,
}

impl From<Vec<TicketView>> for TicketListResponse {
    fn from(tickets: Vec<TicketView>) -> Self {
        Self {
            total: tickets.len(),
            tickets,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Call the next eligible ticket to the operator's service point
pub async fn call_next(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Json(body): Json<ServicePointBody>,
) -> Result<Json<CallNextResponse>, ApiError> {
    let response = match state
        .dispatch()
        .call_next(&body.service_point_id, &user)
        .await?
    {
        Outcome::Ok(ticket) => CallNextResponse::Called { ticket },
        Outcome::Info(Info { kind, message }) => CallNextResponse::Info { kind, message },
    };
    Ok(Json(response))
}

pub async fn start_service(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    Ok(Json(state.lifecycle().start_service(&ticket_id, &user).await?))
}

pub async fn finish(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    Ok(Json(state.lifecycle().finish(&ticket_id, &user).await?))
}

pub async fn mark_no_show(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    Ok(Json(state.lifecycle().mark_no_show(&ticket_id, &user).await?))
}

pub async fn postpone(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketView>, ApiError> {
    Ok(Json(state.lifecycle().postpone(&ticket_id, &user).await?))
}

/// Recall a postponed ticket to the given service point
pub async fn recall(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
    Path(ticket_id): Path<String>,
    Json(body): Json<ServicePointBody>,
) -> Result<Json<TicketView>, ApiError> {
    Ok(Json(
        state
            .lifecycle()
            .recall(&ticket_id, &user, &body.service_point_id)
            .await?,
    ))
}

pub async fn held_tickets(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
) -> Result<Json<TicketListResponse>, ApiError> {
    let tickets = state.lifecycle().held_tickets(&user).await?;
    Ok(Json(tickets.into()))
}

pub async fn active_tickets(
    State(state): State<Arc<AppState>>,
    OperatorUser(user): OperatorUser,
) -> Result<Json<TicketListResponse>, ApiError> {
    let tickets = state.lifecycle().active_tickets(&user).await?;
    Ok(Json(tickets.into()))
}
