//! Optional append-only file persistence for dispatched events.
//!
//! One JSON object per line, written to
//! `<root>/<YYYY-MM-DD>/<entity>-events.log`. This is a secondary, toggleable
//! persistence path consulted by handlers (see `ResourceEventHandler` and
//! `ContainerEventHandler`); it is never the source of truth for replay.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use ldp_core::PodError;
use serde::Serialize;

use crate::envelope::EventEnvelope;

#[derive(Serialize)]
struct LogLine<'a> {
    event_id: uuid::Uuid,
    timestamp: chrono::DateTime<chrono::Utc>,
    entity_type: &'a str,
    event_type: &'a str,
    aggregate_id: &'a str,
    payload: &'a serde_json::Value,
}

/// Appends one line per event to a date-sharded log file under `root`.
pub struct FileEventLog {
    root: PathBuf,
}

impl FileEventLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn append(&self, envelope: &EventEnvelope) -> Result<(), PodError> {
        let entity = match envelope.event().entity_type {
            crate::envelope::EntityType::Resource => "resource",
            crate::envelope::EntityType::Container => "container",
        };

        let day_dir = self.root.join(envelope.timestamp().format("%Y-%m-%d").to_string());
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&day_dir)
            .map_err(|e| PodError::storage_failed("FileEventLog::append", e.to_string()))?;

        let path: &Path = &day_dir.join(format!("{entity}-events.log"));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o644)
            .open(path)
            .map_err(|e| PodError::storage_failed("FileEventLog::append", e.to_string()))?;

        let line = LogLine {
            event_id: envelope.event_id(),
            timestamp: envelope.timestamp(),
            entity_type: entity,
            event_type: envelope.event().event_type,
            aggregate_id: envelope.event().aggregate_id.as_str(),
            payload: &envelope.event().payload,
        };

        let serialized = serde_json::to_string(&line)
            .map_err(|e| PodError::storage_failed("FileEventLog::append", e.to_string()))?;

        writeln!(file, "{serialized}")
            .map_err(|e| PodError::storage_failed("FileEventLog::append", e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EntityType, Event};
    use ldp_core::ResourceId;

    #[test]
    fn append_creates_dated_file_with_one_json_line() {
        let dir = std::env::temp_dir().join(format!("ldp-file-log-test-{}", uuid::Uuid::now_v7()));
        let log = FileEventLog::new(&dir);

        let event = Event::new(
            EntityType::Resource,
            "resource.created",
            ResourceId::new("r1").unwrap(),
            1,
            serde_json::json!({"contentType": "text/plain", "size": 3}),
        );
        let envelope = EventEnvelope::new(uuid::Uuid::now_v7(), chrono::Utc::now(), event);

        log.append(&envelope).unwrap();

        let day_dir = dir.join(envelope.timestamp().format("%Y-%m-%d").to_string());
        let contents = fs::read_to_string(day_dir.join("resource-events.log")).unwrap();
        assert_eq!(contents.lines().count(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn append_sets_unix_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join(format!("ldp-file-log-test-{}", uuid::Uuid::now_v7()));
        let log = FileEventLog::new(&dir);

        let event = Event::new(
            EntityType::Resource,
            "resource.created",
            ResourceId::new("r1").unwrap(),
            1,
            serde_json::json!({}),
        );
        let envelope = EventEnvelope::new(uuid::Uuid::now_v7(), chrono::Utc::now(), event);
        log.append(&envelope).unwrap();

        let day_dir = dir.join(envelope.timestamp().format("%Y-%m-%d").to_string());
        let dir_mode = fs::metadata(&day_dir).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(day_dir.join("resource-events.log")).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o755);
        assert_eq!(file_mode, 0o644);

        fs::remove_dir_all(&dir).ok();
    }
}
