//! `EventPersistenceHandler`: a wildcard observer that captures every
//! dispatched event to the file log regardless of handler topology, and is
//! prepared to emit Activity Streams 2.0 equivalents for future consumers.
//!
//! The AS 2.0 mapping (`to_activity_stream`) is a pure function only; it is
//! never wired to any transport and must not be relied on for correctness.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::envelope::EventEnvelope;
use crate::dispatcher::EventHandler;
use crate::file_log::FileEventLog;
use ldp_core::PodResult;

/// Registered as a wildcard subscriber, ahead of any type-specific handlers,
/// so that a durable record of every event exists independent of whether a
/// materialized-repository handler is wired for its type.
pub struct EventPersistenceHandler {
    file_log: Arc<FileEventLog>,
}

impl EventPersistenceHandler {
    pub fn new(file_log: Arc<FileEventLog>) -> Self {
        Self { file_log }
    }
}

impl EventHandler for EventPersistenceHandler {
    fn handle(&self, envelope: &EventEnvelope) -> PodResult<()> {
        self.file_log.append(envelope)
    }
}

/// Map a committed event to an Activity Streams 2.0-shaped activity.
///
/// Stub: callable, tested for shape, but not delivered anywhere. Present to
/// satisfy the extension point the source system left unimplemented.
pub fn to_activity_stream(envelope: &EventEnvelope) -> Value {
    let event = envelope.event();
    let verb = match event.event_type {
        "resource.created" | "container.created" => "Create",
        "resource.updated" | "container.updated" => "Update",
        "resource.deleted" | "container.deleted" => "Delete",
        "container.member_added" => "Add",
        "container.member_removed" => "Remove",
        "resource.linked" => "Add",
        _ => "Update",
    };

    json!({
        "@context": "https://www.w3.org/ns/activitystreams",
        "type": verb,
        "id": envelope.event_id().to_string(),
        "published": envelope.timestamp(),
        "object": {
            "id": event.aggregate_id.as_str(),
            "type": match event.entity_type {
                crate::envelope::EntityType::Resource => "Document",
                crate::envelope::EntityType::Container => "Collection",
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EntityType, Event};
    use ldp_core::ResourceId;

    fn envelope(event_type: &'static str) -> EventEnvelope {
        let event = Event::new(EntityType::Resource, event_type, ResourceId::new("r1").unwrap(), 1, json!({}));
        EventEnvelope::new(uuid::Uuid::now_v7(), chrono::Utc::now(), event)
    }

    #[test]
    fn handler_writes_every_event_to_the_file_log() {
        let dir = std::env::temp_dir().join(format!("ldp-persistence-handler-test-{}", uuid::Uuid::now_v7()));
        let log = Arc::new(FileEventLog::new(&dir));
        let handler = EventPersistenceHandler::new(log);
        assert!(handler.handle(&envelope("resource.created")).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn activity_stream_mapping_uses_create_for_created_events() {
        let activity = to_activity_stream(&envelope("resource.created"));
        assert_eq!(activity["type"], "Create");
        assert_eq!(activity["object"]["type"], "Document");
    }

    #[test]
    fn activity_stream_mapping_falls_back_to_update_for_unknown_types() {
        let activity = to_activity_stream(&envelope("resource.archived"));
        assert_eq!(activity["type"], "Update");
    }
}
