//! Practice Timer - daily practice checklist with drift-free task timers
//! 
//! This library provides the task timer engine, its once-per-day reset
//! policy, the alarm controller and the HTTP surface that drives them.

pub mod alarm;
pub mod api;
pub mod clock;
pub mod config;
pub mod engine;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::TaskEngine;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
