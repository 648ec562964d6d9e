//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::MonoMs,
    panel::{ChartLayout, KindFilter, TimerView},
    state::{Attempt, Notice, Timer, TimerId, TimerKind},
};

/// Body of `POST /timers`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimerRequest {
    pub kind: TimerKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_ms: u64,
}

/// Body of `PUT /panel/filter`
#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    pub filter: KindFilter,
}

/// Query of `GET /timers/:id/chart.svg`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub dpr: Option<f64>,
}

impl ChartQuery {
    pub fn layout(&self) -> ChartLayout {
        let defaults = ChartLayout::default();
        ChartLayout {
            css_width: self.width.unwrap_or(defaults.css_width),
            css_height: self.height.unwrap_or(defaults.css_height),
            device_pixel_ratio: self.dpr.unwrap_or(defaults.device_pixel_ratio),
        }
    }
}

/// A timer plus the values derived from it at the time of the response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSummary {
    pub id: TimerId,
    pub kind: TimerKind,
    pub name: String,
    pub target_ms: u64,
    pub elapsed_ms: u64,
    pub remaining_ms: Option<u64>,
    pub running: bool,
    pub chart_open: bool,
    pub logs: Vec<Attempt>,
}

impl TimerSummary {
    pub fn at(timer: &Timer, now: MonoMs) -> Self {
        Self {
            id: timer.id,
            kind: timer.kind,
            name: timer.name.clone(),
            target_ms: timer.target_ms,
            elapsed_ms: timer.current_elapsed(now),
            remaining_ms: timer.is_countdown().then(|| timer.remaining(now)),
            running: timer.is_running(),
            chart_open: timer.chart_open,
            logs: timer.logs().to_vec(),
        }
    }
}

/// API response structure for mutation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<Attempt>,
}

impl ApiResponse {
    pub fn new(status: &str, message: String) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer: None,
            attempt: None,
        }
    }

    /// The action was applied
    pub fn ok(message: String, timer: Option<TimerSummary>) -> Self {
        Self {
            timer,
            ..Self::new("ok", message)
        }
    }

    /// The timer no longer exists; nothing happened
    pub fn noop(id: TimerId) -> Self {
        Self::new("noop", format!("Timer {} does not exist", id))
    }

    pub fn error(message: String) -> Self {
        Self::new("error", message)
    }

    pub fn with_attempt(mut self, attempt: Attempt) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

/// Mounted views of the panel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelResponse {
    pub filter: KindFilter,
    pub loop_active: bool,
    pub ticks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    pub views: Vec<TimerView>,
}

/// Status response with panel and persistence information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub filter: KindFilter,
    pub timer_count: usize,
    pub mounted_count: usize,
    pub running_count: usize,
    pub loop_active: bool,
    pub notices: Vec<Notice>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
