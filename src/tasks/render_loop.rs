//! Render loop background task

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::AppState;

/// A startable, stoppable repeating loop
///
/// Runs `tick` every `interval_hint` while the `active` flag is true and
/// parks (no timer armed) while it is false. Returns when the flag's sender
/// is dropped.
pub async fn run<F>(mut active: watch::Receiver<bool>, interval_hint: Duration, mut tick: F)
where
    F: FnMut(),
{
    loop {
        // Park until something is mounted
        if active.wait_for(|on| *on).await.is_err() {
            debug!("Loop flag closed, stopping render loop");
            return;
        }
        debug!("Render loop running every {:?}", interval_hint);

        let mut interval = tokio::time::interval(interval_hint);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => tick(),

                changed = active.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*active.borrow_and_update() {
                        debug!("Nothing mounted, render loop idle");
                        break;
                    }
                }
            }
        }
    }
}

/// Background task driving the shared render loop of the timer panel
pub async fn render_loop_task(state: Arc<AppState>) {
    info!("Starting render loop task");

    let active = state.loop_active_tx.subscribe();
    let tick_state = Arc::clone(&state);
    run(active, state.tick_interval, move || match tick_state.tick() {
        Ok(report) => {
            for id in &report.auto_paused {
                info!("Countdown {} finished", id);
            }
        }
        Err(e) => error!("Render loop tick failed: {}", e),
    })
    .await;
}
