//! Audio devices the alarm controller can drive

use std::{
    io::Write,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle, time::sleep};
use tracing::{debug, info};

/// Minimal playback surface for the alarm sound.
///
/// `stop` must be safe to call when nothing is playing.
pub trait AudioDevice: Send + Sync {
    fn play_loop(&self) -> Result<(), String>;
    fn stop(&self);
    fn reset_playback_position(&self);
}

/// Rings the terminal bell on stderr until stopped
#[derive(Debug)]
pub struct TerminalBell {
    period: Duration,
    player: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalBell {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            player: Mutex::new(None),
        }
    }
}

impl Default for TerminalBell {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl AudioDevice for TerminalBell {
    fn play_loop(&self) -> Result<(), String> {
        let mut player = self.player.lock()
            .map_err(|e| format!("Failed to lock bell player: {}", e))?;

        if player.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("Bell already ringing");
            return Ok(());
        }

        let runtime = Handle::try_current()
            .map_err(|e| format!("No runtime available for bell playback: {}", e))?;
        let period = self.period;

        *player = Some(runtime.spawn(async move {
            loop {
                let mut stderr = std::io::stderr();
                if stderr.write_all(b"\x07").and_then(|_| stderr.flush()).is_err() {
                    break;
                }
                sleep(period).await;
            }
        }));

        info!("Alarm bell started");
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut player) = self.player.lock() {
            if let Some(handle) = player.take() {
                handle.abort();
                info!("Alarm bell stopped");
            }
        }
    }

    fn reset_playback_position(&self) {
        // A bell has no position to rewind.
    }
}

/// Device that only logs, for headless runs
#[derive(Debug, Default)]
pub struct SilentDevice {
    plays: AtomicUsize,
    stops: AtomicUsize,
}

impl SilentDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times playback was started
    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// Number of times playback was stopped
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioDevice for SilentDevice {
    fn play_loop(&self) -> Result<(), String> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        info!("Alarm playing (silent)");
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        debug!("Alarm stopped (silent)");
    }

    fn reset_playback_position(&self) {}
}
