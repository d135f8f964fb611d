//! Task timer engine
//!
//! Owns the task list and drives every countdown from wall-clock deltas:
//! a run remembers when it started and how much time was left at that
//! moment, and every read derives the remaining time from those two values.
//! Periodic ticks only publish what the clock already says, so late or
//! missing ticks never skew the result.
//!
//! Each task carries a generation counter that moves on every state change.
//! A tick scheduled for an older generation is ignored, so a countdown that
//! was paused, reset or superseded can never write again.

pub mod policy;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    alarm::{AlarmController, AudioDevice},
    clock::{practice_day, Clock},
    state::{snapshot::DailySnapshot, task::template, Task},
    store::{KeyValueStore, SAVED_TASKS},
    tasks::countdown_task,
};

/// Default re-evaluation period for running timers
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Result of a periodic re-evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down
    Continue,
    /// Reached zero on this tick; the alarm is ringing
    Expired,
    /// The run this tick belonged to no longer exists
    Stale,
}

/// Completion summary for the day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

struct RunRecord {
    started_at: DateTime<Local>,
    time_left_at_start: u32,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

impl RunRecord {
    /// Whole seconds left at `now`, rounded toward more elapsed time
    fn remaining(&self, now: DateTime<Local>) -> u32 {
        let elapsed_ms = now
            .signed_duration_since(self.started_at)
            .num_milliseconds()
            .max(0);
        let elapsed_secs = u64::try_from(elapsed_ms / 1000).unwrap_or(u64::MAX);
        u64::from(self.time_left_at_start).saturating_sub(elapsed_secs) as u32
    }
}

struct EngineInner {
    tasks: Vec<Task>,
    runs: HashMap<u32, RunRecord>,
    generations: HashMap<u32, u64>,
    alarm: AlarmController,
    /// Practice day the task list belongs to
    day: String,
}

impl EngineInner {
    fn task(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: u32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn bump(&mut self, id: u32) -> u64 {
        let generation = self.generations.entry(id).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Drop the run for `id`, abort its ticker and invalidate pending ticks.
    /// Returns the time that was left at `now`, if a run existed.
    fn cancel_run(&mut self, id: u32, now: DateTime<Local>) -> Option<u32> {
        self.bump(id);
        let run = self.runs.remove(&id)?;
        if let Some(ticker) = &run.ticker {
            ticker.abort();
        }
        Some(run.remaining(now))
    }

    fn cancel_all_runs(&mut self, now: DateTime<Local>) {
        let ids: Vec<u32> = self.tasks.iter().map(|t| t.id).collect();
        for id in ids {
            self.cancel_run(id, now);
        }
    }

    /// Tasks with live remaining time for running countdowns
    fn live_tasks(&self, now: DateTime<Local>) -> Vec<Task> {
        self.tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                if let Some(run) = self.runs.get(&task.id) {
                    task.time_left_seconds = run.remaining(now);
                }
                task
            })
            .collect()
    }
}

/// Single owner of all task state
pub struct TaskEngine {
    inner: Mutex<EngineInner>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    /// Channel publishing the task list after every mutation
    updates_tx: watch::Sender<Vec<Task>>,
    /// Keep the receiver alive to prevent channel closure
    _updates_rx: watch::Receiver<Vec<Task>>,
}

impl TaskEngine {
    /// Load today's tasks from `store` and build the engine.
    ///
    /// Tasks saved while ringing start ringing again.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        device: Arc<dyn AudioDevice>,
        tick_interval: Duration,
    ) -> Arc<Self> {
        let today = practice_day(&clock.now());
        let restored = policy::restore_or_fresh(store.as_ref(), &today);

        let mut alarm = AlarmController::new(device);
        for task in restored.tasks.iter().filter(|t| t.alarm_active) {
            alarm.ring(task.id);
        }

        let (updates_tx, updates_rx) = watch::channel(restored.tasks.clone());
        let engine = Arc::new(Self {
            inner: Mutex::new(EngineInner {
                tasks: restored.tasks,
                runs: HashMap::new(),
                generations: HashMap::new(),
                alarm,
                day: today,
            }),
            store,
            clock,
            tick_interval,
            updates_tx,
            _updates_rx: updates_rx,
        });

        if restored.needs_write {
            if restored.fresh {
                engine.clear_saved_tasks();
            }
            match engine.lock() {
                Ok(inner) => engine.persist(&inner),
                Err(e) => error!("{}", e),
            }
        }

        engine
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineInner>, String> {
        self.inner
            .lock()
            .map_err(|e| format!("Failed to lock task state: {}", e))
    }

    /// Write the snapshot. Failures are logged and in-memory state stays authoritative.
    fn persist(&self, inner: &EngineInner) {
        let snapshot = DailySnapshot::new(inner.day.clone(), inner.tasks.clone());
        if let Err(e) = snapshot.write(self.store.as_ref()) {
            warn!("Failed to save tasks: {}", e);
        }
    }

    fn clear_saved_tasks(&self) {
        if let Err(e) = self.store.remove(SAVED_TASKS) {
            warn!("Failed to clear saved tasks: {}", e);
        }
    }

    /// Persist and notify observers
    fn commit(&self, inner: &EngineInner) {
        self.persist(inner);
        let now = self.clock.now();
        if let Err(e) = self.updates_tx.send(inner.live_tasks(now)) {
            warn!("Failed to send task update: {}", e);
        }
    }

    fn spawn_ticker(self: &Arc<Self>, task_id: u32, generation: u64) -> Option<JoinHandle<()>> {
        match Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(countdown_task(
                Arc::clone(self),
                task_id,
                generation,
                self.tick_interval,
            ))),
            Err(_) => {
                warn!("No async runtime, task {} advances only on explicit ticks", task_id);
                None
            }
        }
    }

    /// Start or restart the countdown of a task.
    ///
    /// Starting a running task supersedes the old run from its current
    /// remaining time. Completed and ringing tasks are left untouched.
    pub fn start(self: &Arc<Self>, task_id: u32) -> Result<Option<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        self.roll_over_locked(&mut inner, now);

        let Some(task) = inner.task(task_id).cloned() else {
            debug!("Ignoring start for unknown task {}", task_id);
            return Ok(None);
        };
        if task.completed || task.alarm_active {
            debug!("Ignoring start for task {} (completed or ringing)", task_id);
            return Ok(Some(task));
        }

        let time_left = inner
            .cancel_run(task_id, now)
            .unwrap_or(task.time_left_seconds);
        let generation = inner.bump(task_id);
        let ticker = self.spawn_ticker(task_id, generation);
        inner.runs.insert(
            task_id,
            RunRecord {
                started_at: now,
                time_left_at_start: time_left,
                generation,
                ticker,
            },
        );

        let started = match inner.task_mut(task_id) {
            Some(task) => {
                task.time_left_seconds = time_left;
                task.is_running = true;
                task.clone()
            }
            None => return Ok(None),
        };

        info!("Started task {} with {}s left", task_id, time_left);
        self.commit(&inner);
        Ok(Some(started))
    }

    /// Re-evaluate a running countdown.
    ///
    /// `generation` must match the run that scheduled this tick.
    pub fn tick(&self, task_id: u32, generation: u64) -> TickOutcome {
        let now = self.clock.now();
        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(e) => {
                error!("{}", e);
                return TickOutcome::Stale;
            }
        };
        if self.roll_over_locked(&mut inner, now) {
            return TickOutcome::Stale;
        }

        let remaining = match inner.runs.get(&task_id) {
            Some(run) if run.generation == generation => run.remaining(now),
            _ => return TickOutcome::Stale,
        };

        if remaining == 0 {
            // The ticker calling us exits on `Expired`, so it is detached rather than aborted.
            inner.runs.remove(&task_id);
            inner.bump(task_id);
            if let Some(task) = inner.task_mut(task_id) {
                task.time_left_seconds = 0;
                task.is_running = false;
                task.alarm_active = true;
            }
            inner.alarm.ring(task_id);
            info!("Task {} timer finished", task_id);
            self.commit(&inner);
            return TickOutcome::Expired;
        }

        let changed = match inner.task_mut(task_id) {
            Some(task) if task.time_left_seconds != remaining => {
                task.time_left_seconds = remaining;
                true
            }
            _ => false,
        };
        if changed {
            self.commit(&inner);
        }
        TickOutcome::Continue
    }

    /// Freeze a running countdown at its current remaining time
    pub fn pause(&self, task_id: u32) -> Result<Option<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        self.roll_over_locked(&mut inner, now);

        let Some(task) = inner.task(task_id).cloned() else {
            debug!("Ignoring pause for unknown task {}", task_id);
            return Ok(None);
        };
        if !task.is_running {
            return Ok(Some(task));
        }

        let remaining = inner
            .cancel_run(task_id, now)
            .unwrap_or(task.time_left_seconds);
        let paused = match inner.task_mut(task_id) {
            Some(task) => {
                task.time_left_seconds = remaining;
                task.is_running = false;
                task.clone()
            }
            None => return Ok(None),
        };

        info!("Paused task {} with {}s left", task_id, remaining);
        self.commit(&inner);
        Ok(Some(paused))
    }

    /// Return a task to its pristine state, silencing its alarm
    pub fn reset(&self, task_id: u32) -> Result<Option<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        self.roll_over_locked(&mut inner, now);

        if inner.task(task_id).is_none() {
            debug!("Ignoring reset for unknown task {}", task_id);
            return Ok(None);
        }

        inner.alarm.acknowledge(task_id);
        inner.cancel_run(task_id, now);
        let reset = match inner.task_mut(task_id) {
            Some(task) => {
                task.reset();
                task.clone()
            }
            None => return Ok(None),
        };

        info!("Reset task {}", task_id);
        self.commit(&inner);
        Ok(Some(reset))
    }

    /// Flip the completion checkbox.
    ///
    /// Marking complete stops a running clock where it is; marking a ringing
    /// task complete acknowledges its alarm. Unmarking never resumes the timer.
    pub fn toggle_completion(&self, task_id: u32) -> Result<Option<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        self.roll_over_locked(&mut inner, now);

        let Some(task) = inner.task(task_id).cloned() else {
            debug!("Ignoring completion toggle for unknown task {}", task_id);
            return Ok(None);
        };

        let toggled = if task.completed {
            match inner.task_mut(task_id) {
                Some(task) => {
                    task.completed = false;
                    task.clone()
                }
                None => return Ok(None),
            }
        } else {
            let remaining = inner.cancel_run(task_id, now);
            if task.alarm_active {
                inner.alarm.acknowledge(task_id);
            }
            match inner.task_mut(task_id) {
                Some(task) => {
                    if let Some(remaining) = remaining {
                        task.time_left_seconds = remaining;
                    }
                    task.is_running = false;
                    task.alarm_active = false;
                    task.completed = true;
                    task.clone()
                }
                None => return Ok(None),
            }
        };

        let state = if toggled.completed { "complete" } else { "incomplete" };
        info!("Task {} marked {}", task_id, state);
        self.commit(&inner);
        Ok(Some(toggled))
    }

    /// Acknowledge a ringing task, which completes it
    pub fn stop_alarm(&self, task_id: u32) -> Result<Option<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        self.roll_over_locked(&mut inner, now);

        let Some(task) = inner.task(task_id).cloned() else {
            debug!("Ignoring stop-alarm for unknown task {}", task_id);
            return Ok(None);
        };
        if !task.alarm_active {
            return Ok(Some(task));
        }

        inner.alarm.acknowledge(task_id);
        inner.cancel_run(task_id, now);
        let stopped = match inner.task_mut(task_id) {
            Some(task) => {
                task.alarm_active = false;
                task.completed = true;
                task.clone()
            }
            None => return Ok(None),
        };

        info!("Alarm stopped for task {}, task complete", task_id);
        self.commit(&inner);
        Ok(Some(stopped))
    }

    /// Reset every task and stamp the snapshot with today
    pub fn reset_all(&self) -> Result<Vec<Task>, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        inner.alarm.acknowledge_all();
        inner.cancel_all_runs(now);
        for task in &mut inner.tasks {
            task.reset();
        }
        inner.day = practice_day(&now);

        info!("All tasks reset for {}", inner.day);
        self.clear_saved_tasks();
        self.commit(&inner);
        Ok(inner.tasks.clone())
    }

    /// Replace the list with the template if the practice day has moved on.
    ///
    /// Returns true if a rollover happened.
    pub fn roll_over_if_new_day(&self) -> Result<bool, String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        Ok(self.roll_over_locked(&mut inner, now))
    }

    /// Swap in the template when `now` falls on a later practice day than
    /// the current list. Runs before every mutation so nothing is applied
    /// to, or saved under, a previous day.
    fn roll_over_locked(&self, inner: &mut EngineInner, now: DateTime<Local>) -> bool {
        let today = practice_day(&now);
        if inner.day == today {
            return false;
        }

        info!("Practice day changed from {} to {}, starting fresh", inner.day, today);
        inner.alarm.acknowledge_all();
        inner.cancel_all_runs(now);
        inner.tasks = template();
        inner.day = today;
        self.clear_saved_tasks();
        self.commit(inner);
        true
    }

    /// Pause every running countdown and silence playback without
    /// acknowledging alarms, so the saved state resumes cleanly.
    pub fn shutdown(&self) -> Result<(), String> {
        let now = self.clock.now();
        let mut inner = self.lock()?;

        let running: Vec<u32> = inner.runs.keys().copied().collect();
        for id in running {
            if let Some(remaining) = inner.cancel_run(id, now) {
                if let Some(task) = inner.task_mut(id) {
                    task.time_left_seconds = remaining;
                    task.is_running = false;
                }
            }
        }
        inner.alarm.release();

        info!("Task engine stopped");
        self.commit(&inner);
        Ok(())
    }

    /// Current task list, with live remaining time for running tasks
    pub fn tasks(&self) -> Result<Vec<Task>, String> {
        let now = self.clock.now();
        Ok(self.lock()?.live_tasks(now))
    }

    pub fn task(&self, task_id: u32) -> Result<Option<Task>, String> {
        Ok(self.tasks()?.into_iter().find(|t| t.id == task_id))
    }

    pub fn progress(&self) -> Result<Progress, String> {
        let inner = self.lock()?;
        let total = inner.tasks.len();
        let completed = inner.tasks.iter().filter(|t| t.completed).count();
        let percentage = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Ok(Progress {
            completed,
            total,
            percentage,
        })
    }

    /// Practice day the current list belongs to
    pub fn practice_day(&self) -> Result<String, String> {
        Ok(self.lock()?.day.clone())
    }

    pub fn ringing(&self) -> Result<Vec<u32>, String> {
        Ok(self.lock()?.alarm.ringing())
    }

    /// Generation of the task's live run, if it is running
    pub fn generation(&self, task_id: u32) -> Option<u64> {
        let inner = self.lock().ok()?;
        inner.runs.get(&task_id).map(|run| run.generation)
    }

    /// Watch the task list; a new value is published on every mutation
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.updates_tx.subscribe()
    }
}
