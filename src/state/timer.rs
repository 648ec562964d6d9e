//! Timer entity and the time arithmetic over it

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::MonoMs;

/// Stable identifier of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(Uuid);

impl TimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a timer counts up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Stopwatch,
    Countdown,
}

impl TimerKind {
    /// Name given to timers created without one
    pub fn default_name(self) -> &'static str {
        match self {
            TimerKind::Stopwatch => "Stopwatch",
            TimerKind::Countdown => "Countdown",
        }
    }
}

/// A captured elapsed-time sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub ms: u64,
    pub captured_at: DateTime<Utc>,
}

/// A single stopwatch or countdown
///
/// `running` is not stored: a timer is running exactly when `started_at` is
/// set. Snapshots still carry an explicit `running` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimerRecord", into = "TimerRecord")]
pub struct Timer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub name: String,
    pub target_ms: u64,
    pub elapsed_ms: u64,
    started_at: Option<MonoMs>,
    logs: Vec<Attempt>,
    pub chart_open: bool,
}

impl Timer {
    /// Build a fresh, paused timer
    ///
    /// The target is dropped for stopwatches; validation of countdown targets
    /// belongs to the store.
    pub fn new(kind: TimerKind, name: &str, target_ms: u64) -> Self {
        let name = name.trim();
        Self {
            id: TimerId::new(),
            kind,
            name: if name.is_empty() {
                kind.default_name().to_string()
            } else {
                name.to_string()
            },
            target_ms: match kind {
                TimerKind::Countdown => target_ms,
                TimerKind::Stopwatch => 0,
            },
            elapsed_ms: 0,
            started_at: None,
            logs: Vec::new(),
            chart_open: kind == TimerKind::Stopwatch,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<MonoMs> {
        self.started_at
    }

    pub fn logs(&self) -> &[Attempt] {
        &self.logs
    }

    pub fn is_countdown(&self) -> bool {
        self.kind == TimerKind::Countdown
    }

    /// Accumulated active time at `now`
    pub fn current_elapsed(&self, now: MonoMs) -> u64 {
        match self.started_at {
            Some(started) => self.elapsed_ms.saturating_add(now.saturating_sub(started)),
            None => self.elapsed_ms,
        }
    }

    /// Time left on a countdown at `now`; always 0 for stopwatches
    pub fn remaining(&self, now: MonoMs) -> u64 {
        match self.kind {
            TimerKind::Countdown => self.target_ms.saturating_sub(self.current_elapsed(now)),
            TimerKind::Stopwatch => 0,
        }
    }

    /// Fraction of a countdown already consumed, in `0.0..=1.0`
    pub fn progress(&self, now: MonoMs) -> f64 {
        if !self.is_countdown() {
            return 0.0;
        }
        let elapsed = self.current_elapsed(now) as f64;
        (elapsed / self.target_ms.max(1) as f64).clamp(0.0, 1.0)
    }

    /// Begin accumulating time. Returns false if already running.
    pub fn start(&mut self, now: MonoMs) -> bool {
        if self.is_running() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Fold the running interval into `elapsed_ms`. Returns false if paused.
    pub fn pause(&mut self, now: MonoMs) -> bool {
        if !self.is_running() {
            return false;
        }
        self.elapsed_ms = self.current_elapsed(now);
        self.started_at = None;
        true
    }

    /// Zero the timer and stop it; the attempt log is kept
    pub fn reset(&mut self) {
        self.started_at = None;
        self.elapsed_ms = 0;
    }

    pub fn record_attempt(&mut self, now: MonoMs, captured_at: DateTime<Utc>) -> &Attempt {
        self.logs.push(Attempt {
            ms: self.current_elapsed(now),
            captured_at,
        });
        &self.logs[self.logs.len() - 1]
    }

    /// True once a running countdown has nothing left
    pub fn countdown_expired(&self, now: MonoMs) -> bool {
        self.is_countdown() && self.is_running() && self.remaining(now) == 0
    }

    /// Stop a restored timer whose start instant belongs to another process
    pub(crate) fn settle_restored(&mut self) {
        self.started_at = None;
    }
}

/// Persisted shape of a timer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimerRecord {
    id: TimerId,
    kind: TimerKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    target_ms: u64,
    #[serde(default)]
    elapsed_ms: u64,
    #[serde(default)]
    running: bool,
    #[serde(default)]
    started_at: Option<MonoMs>,
    #[serde(default)]
    logs: Vec<Attempt>,
    #[serde(default)]
    chart_open: bool,
}

impl From<TimerRecord> for Timer {
    fn from(record: TimerRecord) -> Self {
        let name = record.name.trim();
        Self {
            id: record.id,
            kind: record.kind,
            name: if name.is_empty() {
                record.kind.default_name().to_string()
            } else {
                name.to_string()
            },
            target_ms: match record.kind {
                TimerKind::Countdown => record.target_ms,
                TimerKind::Stopwatch => 0,
            },
            elapsed_ms: record.elapsed_ms,
            started_at: record.started_at.filter(|_| record.running),
            logs: record.logs,
            chart_open: record.chart_open && record.kind == TimerKind::Stopwatch,
        }
    }
}

impl From<Timer> for TimerRecord {
    fn from(timer: Timer) -> Self {
        Self {
            id: timer.id,
            kind: timer.kind,
            name: timer.name,
            target_ms: timer.target_ms,
            elapsed_ms: timer.elapsed_ms,
            running: timer.started_at.is_some(),
            started_at: timer.started_at,
            logs: timer.logs,
            chart_open: timer.chart_open,
        }
    }
}
