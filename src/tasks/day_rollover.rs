//! Day rollover background task

use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tracing::{info, warn};

use crate::engine::TaskEngine;

/// Background task that starts a fresh task list when the practice day changes
pub async fn day_rollover_task(engine: Arc<TaskEngine>, period: Duration) {
    info!("Starting day rollover task");

    let mut interval = interval(period);

    loop {
        interval.tick().await;

        match engine.roll_over_if_new_day() {
            Ok(true) => info!("New practice day, tasks reset"),
            Ok(false) => {}
            Err(e) => warn!("Failed to check for a new practice day: {}", e),
        }
    }
}
