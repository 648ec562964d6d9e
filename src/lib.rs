//! Timer Panel - independent stopwatches and countdowns behind one render loop
//!
//! The library models timers as plain data with drift-free clock arithmetic,
//! keeps them in a store that writes through to a key-value backend, and
//! drives the mounted subset from a single shared tick loop that also
//! produces attempt trend charts.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod panel;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{PanelError, StorageError};
pub use panel::{KindFilter, TimerPanel};
pub use state::{AppState, Timer, TimerId, TimerKind, TimerStore};
pub use utils::signals::shutdown_signal;
