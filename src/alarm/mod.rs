//! Alarm controller
//!
//! Tracks which tasks are ringing and drives the single shared audio
//! device. Playback runs while at least one task is ringing.

pub mod device;

use std::{collections::BTreeSet, sync::Arc};
use tracing::{error, info};

pub use device::{AudioDevice, SilentDevice, TerminalBell};

pub struct AlarmController {
    device: Arc<dyn AudioDevice>,
    ringing: BTreeSet<u32>,
}

impl AlarmController {
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self {
            device,
            ringing: BTreeSet::new(),
        }
    }

    /// Enter the ringing state for a task.
    ///
    /// Playback failures are logged; the caller's visual alarm state still applies.
    pub fn ring(&mut self, task_id: u32) {
        let was_silent = self.ringing.is_empty();
        if !self.ringing.insert(task_id) {
            return;
        }

        info!("Alarm ringing for task {}", task_id);
        if was_silent {
            self.device.reset_playback_position();
            if let Err(e) = self.device.play_loop() {
                error!("Failed to play alarm for task {}: {}", task_id, e);
            }
        }
    }

    /// Leave the ringing state for a task. Returns whether it was ringing.
    pub fn acknowledge(&mut self, task_id: u32) -> bool {
        if !self.ringing.remove(&task_id) {
            return false;
        }

        info!("Alarm acknowledged for task {}", task_id);
        if self.ringing.is_empty() {
            self.silence();
        }
        true
    }

    /// Stop every alarm at once
    pub fn acknowledge_all(&mut self) {
        if !self.ringing.is_empty() {
            self.ringing.clear();
            self.silence();
        }
    }

    /// Stop playback but keep every task's ringing state
    pub fn release(&self) {
        self.silence();
    }

    pub fn is_ringing(&self, task_id: u32) -> bool {
        self.ringing.contains(&task_id)
    }

    pub fn ringing(&self) -> Vec<u32> {
        self.ringing.iter().copied().collect()
    }

    fn silence(&self) {
        self.device.stop();
        self.device.reset_playback_position();
    }
}
