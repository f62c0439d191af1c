//! Hall display and queue statistics endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use cherga_core::{events::QueueStats, service::DisplayBoard};

use super::error::ApiError;
use crate::state::AppState;

pub async fn display_board(
    State(state): State<Arc<AppState>>,
    Path(office_id): Path<String>,
) -> Result<Json<DisplayBoard>, ApiError> {
    Ok(Json(state.display().display_board(&office_id).await?))
}

pub async fn queue_stats(
    State(state): State<Arc<AppState>>,
    Path(office_id): Path<String>,
) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.display().queue_stats(&office_id).await?))
}
