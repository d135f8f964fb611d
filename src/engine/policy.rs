//! Daily reset policy
//!
//! A saved snapshot is only reused on the practice day it was written.
//! Anything else, including unreadable storage, yields the fresh template.

use tracing::{debug, info, warn};

use crate::{
    state::{snapshot::DailySnapshot, task::template, Task},
    store::KeyValueStore,
};

/// Outcome of loading the task list at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    pub tasks: Vec<Task>,
    /// The store no longer matches `tasks` and should be rewritten
    pub needs_write: bool,
    /// `tasks` came from the template rather than a snapshot
    pub fresh: bool,
}

impl Restored {
    fn fresh() -> Self {
        Self {
            tasks: template(),
            needs_write: true,
            fresh: true,
        }
    }
}

/// Load today's task list from `store`
pub fn restore_or_fresh(store: &dyn KeyValueStore, today: &str) -> Restored {
    let snapshot = match DailySnapshot::read(store) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            info!("No saved tasks found, starting from template");
            return Restored::fresh();
        }
        Err(e) => {
            warn!("Failed to load saved tasks, starting from template: {}", e);
            return Restored::fresh();
        }
    };

    if snapshot.date != today {
        info!("Saved tasks are from {}, today is {}; starting fresh", snapshot.date, today);
        return Restored::fresh();
    }

    let mut tasks = snapshot.tasks;
    let mut needs_write = false;
    for task in &mut tasks {
        if task.normalize() {
            debug!("Normalized restored task {} to paused", task.id);
            needs_write = true;
        }
    }

    info!("Restored {} tasks saved earlier today", tasks.len());
    Restored {
        tasks,
        needs_write,
        fresh: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, LAST_SAVED_DATE, SAVED_TASKS};

    fn store_with(date: &str, tasks: Vec<Task>) -> MemoryStore {
        let store = MemoryStore::new();
        DailySnapshot::new(date, tasks).write(&store).unwrap();
        store
    }

    #[test]
    fn empty_store_yields_template() {
        let restored = restore_or_fresh(&MemoryStore::new(), "2024-06-02");
        assert_eq!(restored, Restored::fresh());
    }

    #[test]
    fn yesterday_snapshot_is_discarded() {
        let mut tasks = template();
        tasks[0].completed = true;
        tasks[1].time_left_seconds = 10;
        let restored = restore_or_fresh(&store_with("2024-06-01", tasks), "2024-06-02");
        assert!(restored.fresh);
        assert_eq!(restored.tasks, template());
    }

    #[test]
    fn same_day_snapshot_is_restored_verbatim() {
        let mut tasks = template();
        tasks[2].time_left_seconds = 42;
        tasks[0].completed = true;
        let restored = restore_or_fresh(&store_with("2024-06-02", tasks.clone()), "2024-06-02");
        assert!(!restored.fresh);
        assert!(!restored.needs_write);
        assert_eq!(restored.tasks, tasks);
        assert_eq!(restored.tasks[2].time_left_seconds, 42);
    }

    #[test]
    fn running_task_is_restored_paused() {
        let mut tasks = template();
        tasks[1].is_running = true;
        tasks[1].time_left_seconds = 600;
        let restored = restore_or_fresh(&store_with("2024-06-02", tasks), "2024-06-02");
        assert!(restored.needs_write);
        assert!(!restored.tasks[1].is_running);
        assert_eq!(restored.tasks[1].time_left_seconds, 600);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_template() {
        let store = MemoryStore::new();
        store.set(LAST_SAVED_DATE, b"2024-06-02").unwrap();
        store.set(SAVED_TASKS, b"[{\"id\":").unwrap();
        let restored = restore_or_fresh(&store, "2024-06-02");
        assert!(restored.fresh);
        assert_eq!(restored.tasks, template());
    }
}
