//! State management module
//! 
//! This module contains the task model, its persisted snapshot form and the
//! shared application state handed to HTTP handlers.

pub mod app_state;
pub mod snapshot;
pub mod task;

// Re-export main types
pub use app_state::AppState;
pub use snapshot::DailySnapshot;
pub use task::{Description, RichContent, Task};
