//! Daily snapshot encoding and persistence

use tracing::warn;

use super::task::{rich_content, Description, Task};
use crate::store::{KeyValueStore, StoreError, LAST_SAVED_DATE, SAVED_TASKS};

/// The persisted task list together with the practice day it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySnapshot {
    pub date: String,
    pub tasks: Vec<Task>,
}

impl DailySnapshot {
    pub fn new(date: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            date: date.into(),
            tasks,
        }
    }

    /// Read the snapshot, or `None` when either key is missing
    pub fn read(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        let Some(date) = store.get(LAST_SAVED_DATE)? else {
            return Ok(None);
        };
        let date = String::from_utf8(date).map_err(|e| StoreError::Corrupt {
            key: LAST_SAVED_DATE.to_string(),
            reason: e.to_string(),
        })?;

        let Some(bytes) = store.get(SAVED_TASKS)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            date: date.trim().to_string(),
            tasks: decode_tasks(&bytes)?,
        }))
    }

    /// Overwrite both keys. Tasks are written before the date so a stale
    /// date never vouches for a newer task list.
    pub fn write(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.set(SAVED_TASKS, &encode_tasks(&self.tasks)?)?;
        store.set(LAST_SAVED_DATE, self.date.as_bytes())
    }
}

pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(tasks).map_err(StoreError::Serialize)
}

/// Decode a task list. References to rich content that no longer exists
/// fall back to an empty bullet list.
pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, StoreError> {
    let mut tasks: Vec<Task> = serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: SAVED_TASKS.to_string(),
        reason: e.to_string(),
    })?;

    for task in &mut tasks {
        if let Description::TemplateRef { id } = task.description {
            if rich_content(id).is_none() {
                warn!("Task {} refers to unknown template content {}, dropping it", task.id, id);
                task.description = Description::BulletList { items: Vec::new() };
            }
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::task::template;
    use crate::store::MemoryStore;

    #[test]
    fn wire_format_uses_camel_case_field_names() {
        let mut task = template().remove(1);
        task.time_left_seconds = 42;
        task.alarm_active = false;

        let bytes = encode_tasks(&[task]).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let entry = &json[0];
        for field in [
            "id",
            "title",
            "description",
            "duration",
            "completed",
            "timeLeft",
            "isRunning",
            "alarmActive",
        ] {
            assert!(entry.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(entry["timeLeft"], 42);
        assert_eq!(entry["description"]["kind"], "templateRef");
        assert_eq!(entry["description"]["id"], 2);
    }

    #[test]
    fn snapshot_survives_store_round_trip() {
        let store = MemoryStore::new();
        let mut tasks = template();
        tasks[2].time_left_seconds = 42;
        tasks[3].completed = true;
        let snapshot = DailySnapshot::new("2024-06-01", tasks);

        snapshot.write(&store).unwrap();
        assert_eq!(DailySnapshot::read(&store).unwrap(), Some(snapshot));
    }

    #[test]
    fn missing_tasks_key_reads_as_no_snapshot() {
        let store = MemoryStore::new();
        store.set(LAST_SAVED_DATE, b"2024-06-01").unwrap();
        assert_eq!(DailySnapshot::read(&store).unwrap(), None);
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let store = MemoryStore::new();
        store.set(LAST_SAVED_DATE, b"2024-06-01").unwrap();
        store.set(SAVED_TASKS, b"{not json").unwrap();
        assert!(matches!(
            DailySnapshot::read(&store),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn unknown_template_reference_degrades_to_empty_list() {
        let raw = br#"[{"id":9,"title":"Old","description":{"kind":"templateRef","id":77},
            "duration":60,"completed":false,"timeLeft":60,"isRunning":false,"alarmActive":false}]"#;
        let tasks = decode_tasks(raw).unwrap();
        assert_eq!(tasks[0].description, Description::BulletList { items: vec![] });
    }
}
