//! Owner of the timer collection
//!
//! Every mutation goes through here: the clock arithmetic is applied in
//! memory, then the whole collection is handed to the persister. Unknown ids
//! are treated as stale references and ignored.

use std::sync::Arc;
use tracing::{debug, info};

use super::timer::{Attempt, Timer, TimerId, TimerKind};
use crate::{
    clock::{Clock, MonoMs},
    error::{PanelError, PanelResult},
    storage::{Persister, TIMERS_KEY},
};

pub struct TimerStore {
    /// Most recently created first
    timers: Vec<Timer>,
    clock: Arc<dyn Clock>,
    persister: Option<Persister>,
}

impl TimerStore {
    /// A store that keeps everything in memory only
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: Vec::new(),
            clock,
            persister: None,
        }
    }

    /// A store writing through to `persister` after every mutation
    pub fn with_persister(clock: Arc<dyn Clock>, persister: Persister) -> Self {
        Self {
            timers: Vec::new(),
            clock,
            persister: Some(persister),
        }
    }

    /// Current monotonic instant of the injected clock
    pub fn now(&self) -> MonoMs {
        self.clock.now()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Create a timer and put it at the front of the collection
    pub fn create(&mut self, kind: TimerKind, name: &str, target_ms: u64) -> PanelResult<Timer> {
        if kind == TimerKind::Countdown && target_ms == 0 {
            return Err(PanelError::InvalidDuration);
        }

        let timer = Timer::new(kind, name, target_ms);
        info!("Created {:?} timer '{}' ({})", kind, timer.name, timer.id);
        self.timers.insert(0, timer.clone());
        self.persist();
        Ok(timer)
    }

    pub fn start(&mut self, id: TimerId) -> Option<Timer> {
        let now = self.now();
        self.mutate(id, "start", |t| {
            t.start(now);
        })
    }

    pub fn pause(&mut self, id: TimerId) -> Option<Timer> {
        let now = self.now();
        self.mutate(id, "pause", |t| {
            t.pause(now);
        })
    }

    /// Pause a running timer, start a paused one
    pub fn toggle_running(&mut self, id: TimerId) -> Option<Timer> {
        let now = self.now();
        self.mutate(id, "toggle", |t| {
            if !t.pause(now) {
                t.start(now);
            }
        })
    }

    pub fn reset(&mut self, id: TimerId) -> Option<Timer> {
        self.mutate(id, "reset", Timer::reset)
    }

    /// Log the current elapsed time as an attempt
    ///
    /// Countdowns are accepted too; hiding the control is up to the view.
    pub fn save_attempt(&mut self, id: TimerId) -> Option<Attempt> {
        let now = self.now();
        let captured_at = self.clock.wall_now();
        let timer = self.mutate(id, "save attempt", |t| {
            t.record_attempt(now, captured_at);
        })?;
        timer.logs().last().cloned()
    }

    /// Flip chart visibility; countdowns have no chart and are left alone
    pub fn toggle_chart(&mut self, id: TimerId) -> Option<Timer> {
        if self.get(id)?.kind == TimerKind::Countdown {
            debug!("Ignoring chart toggle for countdown {}", id);
            return self.get(id).cloned();
        }
        self.mutate(id, "toggle chart", |t| t.chart_open = !t.chart_open)
    }

    /// Remove a timer together with its attempt log
    pub fn delete(&mut self, id: TimerId) -> Option<Timer> {
        let index = self.timers.iter().position(|t| t.id == id)?;
        let removed = self.timers.remove(index);
        info!("Deleted timer '{}' ({})", removed.name, id);
        self.persist();
        Some(removed)
    }

    /// Swap in a whole collection, e.g. after a restore or a panel reset
    pub fn replace_all(&mut self, timers: Vec<Timer>) {
        info!("Replacing timer collection ({} timers)", timers.len());
        self.timers = timers;
        self.persist();
    }

    /// Load a restored collection without writing it back
    pub(crate) fn restore(&mut self, mut timers: Vec<Timer>) {
        for timer in timers.iter_mut().filter(|t| t.is_running()) {
            debug!("Restored timer {} was running, restoring it paused", timer.id);
            timer.settle_restored();
        }
        self.timers = timers;
    }

    fn mutate<F>(&mut self, id: TimerId, action: &str, f: F) -> Option<Timer>
    where
        F: FnOnce(&mut Timer),
    {
        let Some(timer) = self.timers.iter_mut().find(|t| t.id == id) else {
            debug!("Ignoring {} for unknown timer {}", action, id);
            return None;
        };
        f(timer);
        let updated = timer.clone();
        debug!("Applied {} to timer {}", action, id);
        self.persist();
        Some(updated)
    }

    fn persist(&self) {
        if let Some(persister) = &self.persister {
            persister.write(TIMERS_KEY, &self.timers);
        }
    }
}

impl std::fmt::Debug for TimerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerStore")
            .field("timers", &self.timers)
            .field("persister", &self.persister)
            .finish()
    }
}
