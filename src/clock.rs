//! Clock sources for the timer engine
//!
//! Timers measure time against a monotonic reading (milliseconds since the
//! clock's origin) so wall-clock adjustments never make a timer jump. Wall
//! time is only used to stamp saved attempts.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};
use chrono::{DateTime, Duration, Utc};

/// Milliseconds on a monotonic timeline
pub type MonoMs = u64;

/// Source of monotonic and wall-clock instants
pub trait Clock: Send + Sync {
    /// Current monotonic instant in milliseconds since the clock's origin
    fn now(&self) -> MonoMs;

    /// Current wall-clock time
    fn wall_now(&self) -> DateTime<Utc>;
}

/// Clock backed by `std::time::Instant` and the system wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> MonoMs {
        self.origin.elapsed().as_millis() as MonoMs
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests and simulations
///
/// Cloning shares the underlying reading, so a test can keep one handle and
/// hand another to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
    wall_origin: DateTime<Utc>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: MonoMs) -> Self {
        Self {
            ms: Arc::new(AtomicU64::new(start_ms)),
            wall_origin: Utc::now(),
        }
    }

    /// Move the clock forward by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute reading
    pub fn set(&self, ms: MonoMs) {
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> MonoMs {
        self.ms.load(Ordering::SeqCst)
    }

    // Wall time follows the monotonic reading so attempt stamps stay ordered.
    fn wall_now(&self) -> DateTime<Utc> {
        self.wall_origin + Duration::milliseconds(self.now() as i64)
    }
}
