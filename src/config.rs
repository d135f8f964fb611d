//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::{Parser, ValueEnum};

/// Which device rings when a timer finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlarmBackend {
    /// Repeat the terminal bell on stderr
    Bell,
    /// Log only
    Silent,
}

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "practice-timer")]
#[command(about = "A local practice-checklist server with drift-free task timers")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the saved task snapshot
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// How often running timers are re-evaluated, in milliseconds
    #[arg(long, default_value = "500")]
    pub tick_ms: u64,

    /// How often to check for a new practice day, in seconds
    #[arg(long, default_value = "30")]
    pub rollover_check_secs: u64,

    /// Alarm output
    #[arg(long, value_enum, default_value = "bell")]
    pub alarm: AlarmBackend,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Directory for the file store, defaulting to the platform data dir
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("practice-timer")))
            .unwrap_or_else(|| PathBuf::from(".practice-timer"))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn rollover_interval(&self) -> Duration {
        Duration::from_secs(self.rollover_check_secs.max(1))
    }
}
