//! Background tasks module
//! 
//! This module contains the background jobs that keep timers and the
//! practice day moving while the HTTP server runs.

pub mod countdown;
pub mod day_rollover;

// Re-export main functions
pub use countdown::countdown_task;
pub use day_rollover::day_rollover_task;
