//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod persistence_notices;
pub mod render_loop;

// Re-export main functions
pub use persistence_notices::persistence_notice_task;
pub use render_loop::render_loop_task;
