use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{display, handlers, kiosk, middleware::metrics_middleware, operator};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Kiosk
        .route("/kiosk/tickets", post(kiosk::issue_ticket))
        .route("/kiosk/offices/{office_id}/services", get(kiosk::list_services))
        // Display and stats
        .route("/display/offices/{office_id}", get(display::display_board))
        .route("/offices/{office_id}/stats", get(display::queue_stats))
        // Operator
        .route("/operator/call-next", post(operator::call_next))
        .route("/operator/tickets/held", get(operator::held_tickets))
        .route("/operator/tickets/active", get(operator::active_tickets))
        .route("/operator/tickets/{id}/start", post(operator::start_service))
        .route("/operator/tickets/{id}/finish", post(operator::finish))
        .route("/operator/tickets/{id}/no-show", post(operator::mark_no_show))
        .route("/operator/tickets/{id}/postpone", post(operator::postpone))
        .route("/operator/tickets/{id}/recall", post(operator::recall))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
