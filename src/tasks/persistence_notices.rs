//! Persistence failure listener

use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::{storage::PersistFailure, state::AppState};

/// Turn failed writes into user-visible notices
///
/// Nothing is retried or rolled back; the in-memory panel stays as it is.
pub async fn persistence_notice_task(
    state: Arc<AppState>,
    mut failures: broadcast::Receiver<PersistFailure>,
) {
    info!("Starting persistence notice task");

    loop {
        match failures.recv().await {
            Ok(failure) => {
                state.add_notice(format!(
                    "Could not save {}: {}. Changes are kept for this session.",
                    failure.key, failure.message
                ));
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Missed {} persistence failures", skipped);
                state.add_notice(format!("{} saves failed", skipped));
            }
            Err(RecvError::Closed) => break,
        }
    }
}
