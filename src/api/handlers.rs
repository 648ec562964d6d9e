//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, warn};

use crate::{
    error::PanelError,
    panel::{ChartOutput, TimerPanel},
    state::{AppState, Timer, TimerId},
};
use super::responses::{
    ApiResponse, ChartQuery, CreateTimerRequest, FilterRequest, HealthResponse, PanelResponse,
    StatusResponse, TimerSummary,
};

fn internal_error(action: &str, e: PanelError) -> StatusCode {
    error!("Failed to {}: {}", action, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Apply a timer action and describe the outcome
fn apply_timer_action<F>(
    state: &AppState,
    action: &str,
    id: TimerId,
    f: F,
) -> Result<Json<ApiResponse>, StatusCode>
where
    F: FnOnce(&mut TimerPanel, TimerId) -> Option<Timer>,
{
    let outcome = state
        .update_panel(action, |panel| {
            f(panel, id).map(|t| TimerSummary::at(&t, panel.store().now()))
        })
        .map_err(|e| internal_error(action, e))?;

    match outcome {
        Some(summary) => {
            info!("Applied {} to timer {}", action, id);
            Ok(Json(ApiResponse::ok(format!("Timer {}", action), Some(summary))))
        }
        None => {
            warn!("Ignoring {} for unknown timer {}", action, id);
            Ok(Json(ApiResponse::noop(id)))
        }
    }
}

/// Handle GET /timers - All timers with derived values
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TimerSummary>>, StatusCode> {
    state
        .read_panel(|panel| {
            let now = panel.store().now();
            panel
                .store()
                .timers()
                .iter()
                .map(|t| TimerSummary::at(t, now))
                .collect()
        })
        .map(Json)
        .map_err(|e| internal_error("list timers", e))
}

/// Handle POST /timers - Create a stopwatch or countdown
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), StatusCode> {
    let outcome = state
        .update_panel("create", |panel| {
            panel
                .create(request.kind, &request.name, request.target_ms)
                .map(|t| TimerSummary::at(&t, panel.store().now()))
        })
        .map_err(|e| internal_error("create timer", e))?;

    match outcome {
        Ok(summary) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(format!("Created {}", summary.name), Some(summary))),
        )),
        Err(e) => {
            warn!("Rejected timer creation: {}", e);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// Handle POST /timers/:id/start
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "start", id, TimerPanel::start)
}

/// Handle POST /timers/:id/pause
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "pause", id, TimerPanel::pause)
}

/// Handle POST /timers/:id/toggle - Play/pause button
pub async fn toggle_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "toggle", id, TimerPanel::toggle_running)
}

/// Handle POST /timers/:id/reset
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "reset", id, TimerPanel::reset)
}

/// Handle POST /timers/:id/chart - Show or hide the attempt chart
pub async fn toggle_chart_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "toggle chart", id, TimerPanel::toggle_chart)
}

/// Handle POST /timers/:id/attempts - Log the current elapsed time
pub async fn save_attempt_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let outcome = state
        .update_panel("save attempt", |panel| {
            let attempt = panel.save_attempt(id)?;
            let timer = panel.store().get(id)?;
            Some((attempt, TimerSummary::at(timer, panel.store().now())))
        })
        .map_err(|e| internal_error("save attempt", e))?;

    Ok(Json(match outcome {
        Some((attempt, summary)) => {
            info!("Saved attempt of {} ms for timer {}", attempt.ms, id);
            ApiResponse::ok("Attempt saved".to_string(), Some(summary)).with_attempt(attempt)
        }
        None => ApiResponse::noop(id),
    }))
}

/// Handle DELETE /timers/:id
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    apply_timer_action(&state, "delete", id, TimerPanel::delete)
}

/// Handle GET /timers/:id/chart.svg
pub async fn chart_svg_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, StatusCode> {
    let output = state
        .read_panel(|panel| panel.chart(id, query.layout()))
        .map_err(|e| internal_error("render chart", e))?;

    match output {
        Some(ChartOutput::Drawn(scene)) => Ok((
            [(header::CONTENT_TYPE, "image/svg+xml")],
            scene.to_svg(),
        )
            .into_response()),
        Some(ChartOutput::Placeholder { message }) => {
            Ok((StatusCode::NOT_FOUND, Json(ApiResponse::error(message.to_string()))).into_response())
        }
        Some(ChartOutput::Hidden) => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Chart is hidden for this timer".to_string())),
        )
            .into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(ApiResponse::noop(id))).into_response()),
    }
}

/// Handle PUT /timers/:id/layout - Resize a mounted view's chart
pub async fn chart_layout_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TimerId>,
    Json(query): Json<ChartQuery>,
) -> Result<Response, StatusCode> {
    let view = state
        .update_panel("resize chart", |panel| {
            panel.resize_chart(id, query.layout()).cloned()
        })
        .map_err(|e| internal_error("resize chart", e))?;

    match view {
        Some(view) => Ok(Json(view).into_response()),
        None => {
            warn!("Ignoring chart resize for unmounted timer {}", id);
            Ok((StatusCode::NOT_FOUND, Json(ApiResponse::noop(id))).into_response())
        }
    }
}

fn panel_response(panel: &TimerPanel) -> PanelResponse {
    PanelResponse {
        filter: panel.filter(),
        loop_active: panel.is_loop_active(),
        ticks: panel.scheduler().ticks(),
        hint: panel.empty_hint(),
        views: panel.scheduler().views().cloned().collect(),
    }
}

/// Handle GET /panel - Mounted views
pub async fn panel_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PanelResponse>, StatusCode> {
    state
        .read_panel(panel_response)
        .map(Json)
        .map_err(|e| internal_error("read panel", e))
}

/// Handle POST /panel/render - Rebuild the mounted set
pub async fn render_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PanelResponse>, StatusCode> {
    state
        .update_panel("render", |panel| {
            panel.render();
            panel_response(panel)
        })
        .map(Json)
        .map_err(|e| internal_error("render panel", e))
}

/// Handle PUT /panel/filter - Switch between stopwatches and countdowns
pub async fn filter_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<PanelResponse>, StatusCode> {
    state
        .update_panel("filter", |panel| {
            panel.set_filter(request.filter);
            panel_response(panel)
        })
        .map(Json)
        .map_err(|e| internal_error("switch filter", e))
}

/// Handle POST /reset - Drop every timer and clear storage
pub async fn reset_all_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state
        .update_panel("reset all", TimerPanel::clear_all)
        .map_err(|e| internal_error("reset panel", e))?;
    state.clear_notices();
    info!("Panel reset");
    Ok(Json(ApiResponse::ok("All timers removed".to_string(), None)))
}

/// Handle GET /status - Return current panel status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let (filter, timer_count, mounted_count, running_count) = state
        .read_panel(|panel| {
            let timers = panel.store().timers();
            (
                panel.filter(),
                timers.len(),
                panel.scheduler().mounted().len(),
                timers.iter().filter(|t| t.is_running()).count(),
            )
        })
        .map_err(|e| internal_error("read status", e))?;

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        filter,
        timer_count,
        mounted_count,
        running_count,
        loop_active: state.is_loop_active(),
        notices: state.get_notices(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
