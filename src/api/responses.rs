//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::Progress,
    state::{task::rich_content, Description, RichContent, Task},
    utils::format_clock,
};

/// A task as shown to clients: the stored fields plus display helpers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    /// Remaining time as `MM:SS`
    pub display: String,
    /// Resolved rich description for template references
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich: Option<RichContent>,
}

impl TaskView {
    pub fn new(task: Task) -> Self {
        let rich = match task.description {
            Description::TemplateRef { id } => rich_content(id),
            _ => None,
        };
        Self {
            display: format_clock(task.time_left_seconds),
            rich,
            task,
        }
    }

    pub fn list(tasks: Vec<Task>) -> Vec<Self> {
        tasks.into_iter().map(Self::new).collect()
    }
}

/// API response structure for task command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub tasks: Vec<TaskView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, tasks: Vec<Task>) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            tasks: TaskView::list(tasks),
        }
    }

    /// Create a response for an applied command
    pub fn applied(message: String, tasks: Vec<Task>) -> Self {
        Self::new("ok".to_string(), message, tasks)
    }

    /// Create a response for a command addressed to an unknown task
    pub fn ignored(message: String, tasks: Vec<Task>) -> Self {
        Self::new("ignored".to_string(), message, tasks)
    }
}

/// Status response with progress and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub tasks: Vec<TaskView>,
    pub progress: Progress,
    pub practice_day: String,
    pub ringing: Vec<u32>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
