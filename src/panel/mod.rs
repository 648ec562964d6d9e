//! Timer panel: the store, its mounted views and the render loop state
//!
//! Every user mutation goes to the store first and is then repainted right
//! away, so the display never waits for the next tick. Creation and deletion
//! rebuild the mounted set.

pub mod chart;
pub mod filter;
pub mod scheduler;
pub mod view;

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    error::PanelResult,
    state::{Attempt, Timer, TimerId, TimerKind, TimerStore},
    storage::{Persister, FILTER_KEY, TIMERS_KEY},
};

pub use chart::{ChartEngine, ChartOutput, ChartScene, ChartSurface, Trend};
pub use filter::KindFilter;
pub use scheduler::{RenderScheduler, TickReport};
pub use view::{format_ms, ChartLayout, TimerView};

/// Shown when no timer passes the filter
pub const EMPTY_HINT: &str = "Nothing here yet. Create a timer.";

#[derive(Debug)]
pub struct TimerPanel {
    store: TimerStore,
    scheduler: RenderScheduler,
    persister: Option<Persister>,
}

impl TimerPanel {
    /// Panel over an existing store, nothing mounted until [`render`](Self::render)
    pub fn new(store: TimerStore, filter: KindFilter) -> Self {
        Self {
            store,
            scheduler: RenderScheduler::new(filter),
            persister: None,
        }
    }

    /// Load timers and filter from the backend and mount the visible set
    ///
    /// Unreadable values are logged and replaced by defaults.
    pub async fn restore(clock: Arc<dyn Clock>, persister: Persister) -> Self {
        let timers: Vec<Timer> = match persister.read(TIMERS_KEY).await {
            Ok(timers) => timers.unwrap_or_default(),
            Err(e) => {
                warn!("Could not restore timers, starting empty: {}", e);
                Vec::new()
            }
        };
        let filter: KindFilter = match persister.read(FILTER_KEY).await {
            Ok(filter) => filter.unwrap_or_default(),
            Err(e) => {
                warn!("Could not restore timer filter: {}", e);
                KindFilter::default()
            }
        };
        info!("Restored {} timers, filter {}", timers.len(), filter);

        let mut store = TimerStore::with_persister(clock, persister.clone());
        store.restore(timers);
        let mut panel = Self {
            store,
            scheduler: RenderScheduler::new(filter),
            persister: Some(persister),
        };
        panel.render();
        panel
    }

    pub fn store(&self) -> &TimerStore {
        &self.store
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn filter(&self) -> KindFilter {
        self.scheduler.filter()
    }

    pub fn is_loop_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn empty_hint(&self) -> Option<&'static str> {
        (!self.scheduler.is_active()).then_some(EMPTY_HINT)
    }

    /// Rebuild the mounted set from the current filter and store contents
    pub fn render(&mut self) -> usize {
        self.scheduler.render(&mut self.store)
    }

    pub fn set_filter(&mut self, filter: KindFilter) -> usize {
        if let Some(persister) = &self.persister {
            persister.write(FILTER_KEY, &filter);
        }
        self.scheduler.set_filter(filter, &mut self.store)
    }

    pub fn tick(&mut self) -> TickReport {
        self.scheduler.tick(&mut self.store)
    }

    pub fn create(&mut self, kind: TimerKind, name: &str, target_ms: u64) -> PanelResult<Timer> {
        let timer = self.store.create(kind, name, target_ms)?;
        self.render();
        Ok(timer)
    }

    pub fn start(&mut self, id: TimerId) -> Option<Timer> {
        let timer = self.store.start(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(timer)
    }

    pub fn pause(&mut self, id: TimerId) -> Option<Timer> {
        let timer = self.store.pause(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(timer)
    }

    pub fn toggle_running(&mut self, id: TimerId) -> Option<Timer> {
        let timer = self.store.toggle_running(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(timer)
    }

    pub fn reset(&mut self, id: TimerId) -> Option<Timer> {
        let timer = self.store.reset(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(timer)
    }

    pub fn save_attempt(&mut self, id: TimerId) -> Option<Attempt> {
        let attempt = self.store.save_attempt(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(attempt)
    }

    pub fn toggle_chart(&mut self, id: TimerId) -> Option<Timer> {
        let timer = self.store.toggle_chart(id)?;
        self.scheduler.repaint(id, &mut self.store);
        Some(timer)
    }

    /// Delete a timer, release its view handle and remount the rest
    pub fn delete(&mut self, id: TimerId) -> Option<Timer> {
        let removed = self.store.delete(id)?;
        self.scheduler.release(id);
        self.render();
        Some(removed)
    }

    /// Lay out a timer's chart at the given size on a scratch surface
    ///
    /// Read-only: mounted views keep their own surface and layout.
    pub fn chart(&self, id: TimerId, layout: ChartLayout) -> Option<ChartOutput> {
        let timer = self.store.get(id)?;
        let mut surface = ChartSurface::new();
        surface.fit(layout.css_width, layout.css_height, layout.device_pixel_ratio);
        Some(ChartEngine::new().render_timer(timer, &surface))
    }

    /// Resize the chart of a mounted view and redraw it
    pub fn resize_chart(&mut self, id: TimerId, layout: ChartLayout) -> Option<&TimerView> {
        self.scheduler.resize_chart(id, layout, &self.store)?;
        self.scheduler.view(id)
    }

    /// Forget every timer and clear the backend
    pub fn clear_all(&mut self) {
        info!("Clearing all timers");
        self.scheduler.unmount_all();
        self.store.restore(Vec::new());
        if let Some(persister) = &self.persister {
            persister.clear();
        }
        self.scheduler = RenderScheduler::new(KindFilter::default());
        self.render();
    }
}
