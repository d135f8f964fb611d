//! Periodic re-evaluation of one running countdown

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::engine::{TaskEngine, TickOutcome};

/// Drive one run of a task's countdown until it expires or is superseded.
///
/// Each tick only asks the engine to re-read the clock, so delayed or
/// skipped ticks do not affect the remaining time.
pub async fn countdown_task(
    engine: Arc<TaskEngine>,
    task_id: u32,
    generation: u64,
    period: Duration,
) {
    debug!("Countdown for task {} (generation {}) started", task_id, generation);

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match engine.tick(task_id, generation) {
            TickOutcome::Continue => {}
            TickOutcome::Expired => {
                debug!("Countdown for task {} expired", task_id);
                break;
            }
            TickOutcome::Stale => {
                debug!("Countdown for task {} (generation {}) superseded", task_id, generation);
                break;
            }
        }
    }
}
