//! Shared render loop over the mounted timers
//!
//! The scheduler owns the view handles of the mounted set, keyed by timer id
//! in parallel to the store. One tick refreshes only the views whose display
//! can change on its own: running timers and countdowns. A paused stopwatch
//! is repainted on mutation only.

use std::collections::HashMap;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    chart::{ChartEngine, ChartOutput},
    filter::KindFilter,
    view::{ChartLayout, TimerView},
};
use crate::state::{TimerId, TimerStore};

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub repainted: Vec<TimerId>,
    pub auto_paused: Vec<TimerId>,
}

#[derive(Debug)]
pub struct RenderScheduler {
    filter: KindFilter,
    /// Mount order, mirrors the store order
    mounted: Vec<TimerId>,
    views: HashMap<TimerId, TimerView>,
    charts: ChartEngine,
    ticks: u64,
}

impl RenderScheduler {
    pub fn new(filter: KindFilter) -> Self {
        Self {
            filter,
            mounted: Vec::new(),
            views: HashMap::new(),
            charts: ChartEngine::new(),
            ticks: 0,
        }
    }

    pub fn filter(&self) -> KindFilter {
        self.filter
    }

    /// The loop only runs while something is mounted
    pub fn is_active(&self) -> bool {
        !self.mounted.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn mounted(&self) -> &[TimerId] {
        &self.mounted
    }

    pub fn view(&self, id: TimerId) -> Option<&TimerView> {
        self.views.get(&id)
    }

    /// Mounted views in display order
    pub fn views(&self) -> impl Iterator<Item = &TimerView> {
        self.mounted.iter().filter_map(|id| self.views.get(id))
    }

    /// Rebuild the mounted set from the filter and the store, then paint
    /// every view once. Returns the number of mounted timers.
    pub fn render(&mut self, store: &mut TimerStore) -> usize {
        let mut previous = std::mem::take(&mut self.views);
        self.mounted = store
            .timers()
            .iter()
            .filter(|t| self.filter.admits(t))
            .map(|t| t.id)
            .collect();

        for timer in store.timers().iter().filter(|t| self.filter.admits(t)) {
            let view = match previous.remove(&timer.id) {
                Some(old) => TimerView::remount(timer, old),
                None => TimerView::mount(timer),
            };
            self.views.insert(timer.id, view);
        }

        for id in self.mounted.clone() {
            self.repaint(id, store);
        }

        debug!(
            "Rendered {} {} timers ({} unmounted)",
            self.mounted.len(),
            self.filter,
            previous.len()
        );
        self.mounted.len()
    }

    /// Switch filters: unmount everything, mount the new set and repaint it
    pub fn set_filter(&mut self, filter: KindFilter, store: &mut TimerStore) -> usize {
        info!("Switching timer filter from {} to {}", self.filter, filter);
        self.filter = filter;
        self.views.clear();
        self.mounted.clear();
        self.render(store)
    }

    /// Refresh the views that need it and auto-pause finished countdowns
    pub fn tick(&mut self, store: &mut TimerStore) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_active() {
            return report;
        }

        for id in self.mounted.clone() {
            let needs_repaint = match store.get(id) {
                Some(t) => t.is_running() || t.is_countdown(),
                None => false,
            };
            if !needs_repaint {
                continue;
            }
            if let Some(auto_paused) = self.refresh(id, store) {
                report.repainted.push(id);
                if auto_paused {
                    report.auto_paused.push(id);
                }
            }
        }

        self.ticks += 1;
        report
    }

    /// Full repaint of one view after a mutation, chart included
    pub fn repaint(&mut self, id: TimerId, store: &mut TimerStore) -> bool {
        if self.refresh(id, store).is_none() {
            return false;
        }
        if let (Some(timer), Some(view)) = (store.get(id), self.views.get_mut(&id)) {
            view.paint_chart(timer, &self.charts);
        }
        true
    }

    /// Set the chart layout of a mounted view and redraw its chart
    pub fn resize_chart(
        &mut self,
        id: TimerId,
        layout: ChartLayout,
        store: &TimerStore,
    ) -> Option<&ChartOutput> {
        let timer = store.get(id)?;
        let view = self.views.get_mut(&id)?;
        view.set_layout(layout);
        view.paint_chart(timer, &self.charts);
        Some(&view.chart)
    }

    /// Drop the view handle of a deleted timer
    pub fn release(&mut self, id: TimerId) -> Option<TimerView> {
        self.mounted.retain(|m| *m != id);
        self.views.remove(&id)
    }

    /// Drop every view handle
    pub fn unmount_all(&mut self) {
        self.mounted.clear();
        self.views.clear();
    }

    /// Repaint the time display of one view. Returns whether the timer was
    /// auto-paused, or `None` if it is not mounted or no longer exists.
    fn refresh(&mut self, id: TimerId, store: &mut TimerStore) -> Option<bool> {
        if !self.views.contains_key(&id) {
            return None;
        }
        let now = store.now();
        let expired = store.get(id)?.countdown_expired(now);
        if expired {
            info!("Countdown {} reached zero, pausing", id);
            store.pause(id);
        }

        let timer = store.get(id)?;
        let view = self.views.get_mut(&id)?;
        view.paint(timer, now);
        Some(expired)
    }
}
