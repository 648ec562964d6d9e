//! State management module
//!
//! Timer entities, the store that owns them, and the shared application
//! state the server hands to its handlers and background tasks.

pub mod app_state;
pub mod timer;
pub mod timer_store;

// Re-export main types
pub use app_state::{AppState, Notice};
pub use timer::{Attempt, Timer, TimerId, TimerKind};
pub use timer_store::TimerStore;
