//! Practice task structure and the daily template

use serde::{Deserialize, Serialize};

/// What a task asks the player to practice.
///
/// Content that cannot be stored as text is kept as a reference into the
/// template and resolved with [`rich_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Description {
    PlainText { text: String },
    BulletList { items: Vec<String> },
    TemplateRef { id: u32 },
}

impl Description {
    fn bullets(items: &[&str]) -> Self {
        Description::BulletList {
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Display payload for template-referenced descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichContent {
    pub label: String,
    pub image: String,
    pub alt: String,
}

/// A timed practice task.
///
/// `time_left_seconds` is authoritative only while the task is not running;
/// during a run the engine derives the live value from its run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: Description,
    /// Target duration in seconds, fixed by the template
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    pub completed: bool,
    #[serde(rename = "timeLeft")]
    pub time_left_seconds: u32,
    pub is_running: bool,
    pub alarm_active: bool,
}

impl Task {
    /// Create a pristine task with a full countdown
    pub fn new(id: u32, title: &str, description: Description, duration_seconds: u32) -> Self {
        Self {
            id,
            title: title.to_string(),
            description,
            duration_seconds,
            completed: false,
            time_left_seconds: duration_seconds,
            is_running: false,
            alarm_active: false,
        }
    }

    /// Return to the pristine state, keeping identity and text
    pub fn reset(&mut self) {
        self.time_left_seconds = self.duration_seconds;
        self.is_running = false;
        self.alarm_active = false;
        self.completed = false;
    }

    /// Repair flag combinations that cannot occur in a live session.
    ///
    /// Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();

        // No run record outlives the process, so a running task is paused.
        self.is_running = false;
        self.time_left_seconds = self.time_left_seconds.min(self.duration_seconds);
        if self.alarm_active {
            self.time_left_seconds = 0;
        }

        *self != before
    }
}

/// The fixed task list used whenever no same-day snapshot exists
pub fn template() -> Vec<Task> {
    vec![
        Task::new(
            1,
            "Open String Picking",
            Description::bullets(&["53231323", "53(12)3", "532123"]),
            5 * 60,
        ),
        Task::new(2, "Scale Practice", Description::TemplateRef { id: 2 }, 15 * 60),
        Task::new(
            3,
            "Finger Exercise",
            Description::bullets(&[
                "1234-1234-1234",
                "4321-4321-4321",
                "1234-2345-3456",
                "6543-5432-4321",
                "1324-1324-1324",
                "4231-4231-4231",
                "1434-2434-3424",
                "Cross-string-1(2)34-1(2)3(4)",
            ]),
            15 * 60,
        ),
        Task::new(
            4,
            "Chord Transitions",
            Description::bullets(&[
                "C-G-C-G",
                "C-Fm-C-Fm",
                "G-Fm-G-Fm",
                "Am-Em-Am-Em",
                "Dm-Em-Dm-Em",
                "Em-Dm-Em-Dm",
            ]),
            15 * 60,
        ),
    ]
}

/// Resolve the rich description a template task refers to
pub fn rich_content(template_id: u32) -> Option<RichContent> {
    match template_id {
        2 => Some(RichContent {
            label: "La".to_string(),
            image: "/images/La.png".to_string(),
            alt: "Scale Diagram".to_string(),
        }),
        _ => None,
    }
}
