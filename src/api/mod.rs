//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route("/timers/:id", axum::routing::delete(delete_timer_handler))
        .route("/timers/:id/start", post(start_handler))
        .route("/timers/:id/pause", post(pause_handler))
        .route("/timers/:id/toggle", post(toggle_handler))
        .route("/timers/:id/reset", post(reset_handler))
        .route("/timers/:id/attempts", post(save_attempt_handler))
        .route("/timers/:id/chart", post(toggle_chart_handler))
        .route("/timers/:id/chart.svg", get(chart_svg_handler))
        .route("/timers/:id/layout", put(chart_layout_handler))
        .route("/panel", get(panel_handler))
        .route("/panel/render", post(render_handler))
        .route("/panel/filter", put(filter_handler))
        .route("/reset", post(reset_all_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
