//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::{PanelError, PanelResult},
    panel::TimerPanel,
};

/// Oldest notices are dropped past this many
const MAX_NOTICES: usize = 20;

/// A user-visible message, e.g. a failed save
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Shared state behind the HTTP handlers and the render loop
#[derive(Debug)]
pub struct AppState {
    /// Store, mounted views and loop state, locked as one unit
    pub panel: Arc<Mutex<TimerPanel>>,
    /// Interval hint for the render loop
    pub tick_interval: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Persistence failures and similar messages for the client
    pub notices: Arc<Mutex<Vec<Notice>>>,
    /// Whether the render loop should be running
    pub loop_active_tx: watch::Sender<bool>,
    /// Keep the receiver alive to prevent channel closure
    pub _loop_active_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(panel: TimerPanel, port: u16, host: String, tick_interval: Duration) -> Self {
        let (loop_active_tx, loop_active_rx) = watch::channel(panel.is_loop_active());

        Self {
            panel: Arc::new(Mutex::new(panel)),
            tick_interval,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            notices: Arc::new(Mutex::new(Vec::new())),
            loop_active_tx,
            _loop_active_rx: loop_active_rx,
        }
    }

    /// Run a user action against the panel
    ///
    /// The panel stays locked for the whole action, so the render loop never
    /// sees a half-applied mutation. Afterwards the loop is woken or parked
    /// depending on whether anything is still mounted.
    pub fn update_panel<T, F>(&self, action: &str, updater: F) -> PanelResult<T>
    where
        F: FnOnce(&mut TimerPanel) -> T,
    {
        let mut panel = self.lock_panel()?;
        let out = updater(&mut panel);
        let active = panel.is_loop_active();
        drop(panel);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        self.publish_loop_state(active);
        Ok(out)
    }

    /// Read from the panel without recording an action
    pub fn read_panel<T, F>(&self, reader: F) -> PanelResult<T>
    where
        F: FnOnce(&TimerPanel) -> T,
    {
        let panel = self.lock_panel()?;
        Ok(reader(&panel))
    }

    /// One render loop tick
    pub fn tick(&self) -> PanelResult<crate::panel::TickReport> {
        let mut panel = self.lock_panel()?;
        let report = panel.tick();
        let active = panel.is_loop_active();
        drop(panel);

        self.publish_loop_state(active);
        Ok(report)
    }

    fn lock_panel(&self) -> PanelResult<std::sync::MutexGuard<'_, TimerPanel>> {
        self.panel
            .lock()
            .map_err(|e| PanelError::Lock(e.to_string()))
    }

    fn publish_loop_state(&self, active: bool) {
        let changed = self.loop_active_tx.send_if_modified(|current| {
            if *current == active {
                return false;
            }
            *current = active;
            true
        });
        if changed {
            debug!("Render loop {}", if active { "requested" } else { "idle" });
        }
    }

    pub fn is_loop_active(&self) -> bool {
        *self.loop_active_tx.borrow()
    }

    /// Record a user-visible notice
    pub fn add_notice(&self, message: String) {
        warn!("Notice: {}", message);
        match self.notices.lock() {
            Ok(mut notices) => {
                notices.push(Notice {
                    message,
                    at: Utc::now(),
                });
                let overflow = notices.len().saturating_sub(MAX_NOTICES);
                notices.drain(..overflow);
            }
            Err(e) => warn!("Failed to lock notices: {}", e),
        }
    }

    pub fn get_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn clear_notices(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
