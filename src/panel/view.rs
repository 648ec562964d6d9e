//! Presentation data for a mounted timer
//!
//! A [`TimerView`] is the view handle of one timer: disposable text and
//! chart state derived from the store. It never holds authoritative state.

use serde::Serialize;

use super::chart::{ChartEngine, ChartOutput, ChartSurface};
use crate::{
    clock::MonoMs,
    state::{Timer, TimerId, TimerKind},
};

/// Format milliseconds as `hh:mm:ss.mmm`
pub fn format_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Format milliseconds as `hh:mm:ss`
pub fn format_duration(ms: u64) -> String {
    let full = format_ms(ms);
    full[..full.len() - 4].to_string()
}

/// Logical layout requested for a view's chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            css_width: super::chart::MIN_CSS_WIDTH,
            css_height: super::chart::MIN_CSS_HEIGHT,
            device_pixel_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub id: TimerId,
    pub name: String,
    pub kind: TimerKind,
    pub time_text: String,
    pub status_text: &'static str,
    pub play_label: &'static str,
    pub detail_text: String,
    /// Countdown progress, 0–100
    pub progress_percent: Option<u8>,
    pub note: Option<String>,
    pub chart: ChartOutput,
    pub chart_surface: ChartSurface,
    pub chart_toggle_enabled: bool,
    pub save_attempt_visible: bool,
    /// Times the time display was refreshed
    pub repaints: u64,
    #[serde(skip)]
    layout: ChartLayout,
}

impl TimerView {
    pub fn mount(timer: &Timer) -> Self {
        Self {
            id: timer.id,
            name: timer.name.clone(),
            kind: timer.kind,
            time_text: String::new(),
            status_text: "",
            play_label: "",
            detail_text: String::new(),
            progress_percent: None,
            note: None,
            chart: ChartOutput::Hidden,
            chart_surface: ChartSurface::new(),
            chart_toggle_enabled: timer.kind == TimerKind::Stopwatch,
            save_attempt_visible: timer.kind == TimerKind::Stopwatch,
            repaints: 0,
            layout: ChartLayout::default(),
        }
    }

    /// Mount a timer keeping the chart backing store of a previous view
    pub(crate) fn remount(timer: &Timer, previous: TimerView) -> Self {
        Self {
            chart_surface: previous.chart_surface,
            layout: previous.layout,
            ..Self::mount(timer)
        }
    }

    pub fn layout(&self) -> ChartLayout {
        self.layout
    }

    pub(crate) fn set_layout(&mut self, layout: ChartLayout) {
        self.layout = layout;
    }

    /// Refresh the time display and status
    pub(crate) fn paint(&mut self, timer: &Timer, now: MonoMs) {
        let shown = match timer.kind {
            TimerKind::Countdown => timer.remaining(now),
            TimerKind::Stopwatch => timer.current_elapsed(now),
        };
        self.name.clone_from(&timer.name);
        self.time_text = format_ms(shown);
        self.status_text = if timer.is_running() { "Running" } else { "Paused" };
        self.play_label = if timer.is_running() { "⏸" } else { "▶" };
        self.detail_text = match timer.kind {
            TimerKind::Countdown => format!("Duration: {}", format_duration(timer.target_ms)),
            TimerKind::Stopwatch => format!("Attempts: {}", timer.logs().len()),
        };
        self.progress_percent = timer
            .is_countdown()
            .then(|| (timer.progress(now) * 100.0).round() as u8);
        self.repaints += 1;
    }

    /// Refresh the chart panel and trend note
    pub(crate) fn paint_chart(&mut self, timer: &Timer, charts: &ChartEngine) {
        let layout = self.layout;
        self.chart_surface
            .fit(layout.css_width, layout.css_height, layout.device_pixel_ratio);
        self.chart = charts.render_timer(timer, &self.chart_surface);
        self.note = charts.note(timer);
    }
}
