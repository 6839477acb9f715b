//! `ResourceEventHandler`: the subscriber that reconciles the materialized
//! resource repository from dispatched `resource.*` events.
//!
//! Hybrid consistency (SPEC_FULL.md §5) means the repository is usually
//! already correct by the time this handler runs, since `StorageService`
//! writes it directly before committing. This handler exists for the
//! purely event-sourced replay path (rebuilding the repository from the
//! log) and as a safety net when dispatch runs without a preceding direct
//! write. Durable file logging of every event, regardless of handler
//! topology, is `ldp_events::EventPersistenceHandler`'s job, not this one's.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine;
use chrono::Utc;
use ldp_core::{PodError, PodResult, ResourceId};
use ldp_events::{EventEnvelope, EventHandler};
use tracing::warn;

use crate::repository::{ResourceRepository, StoredResource};

pub struct ResourceEventHandler {
    repository: Arc<dyn ResourceRepository>,
}

impl ResourceEventHandler {
    pub fn new(repository: Arc<dyn ResourceRepository>) -> Self {
        Self { repository }
    }

    fn apply(&self, envelope: &EventEnvelope) -> PodResult<()> {
        let event = envelope.event();
        match event.event_type {
            "resource.created" | "resource.updated" => self.apply_upsert(event.aggregate_id.clone(), &event.payload),
            "resource.deleted" => {
                match self.repository.delete(&event.aggregate_id) {
                    Ok(()) => Ok(()),
                    // Already absent (e.g. hybrid write already removed it): not an error.
                    Err(_) => Ok(()),
                }
            }
            other => {
                tracing::debug!(event_type = other, "unknown resource event type; dropped for forward compatibility");
                Ok(())
            }
        }
    }

    fn apply_upsert(&self, id: ResourceId, payload: &serde_json::Value) -> PodResult<()> {
        let content_type = payload
            .get("contentType")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("application/octet-stream")
            .to_string();
        let size = payload.get("size").and_then(serde_json::Value::as_u64).unwrap_or(0) as usize;

        let data = match payload.get("data").and_then(serde_json::Value::as_str) {
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| PodError::storage_failed("ResourceEventHandler::apply_upsert", e.to_string()))?,
            None => {
                if self.repository.exists(&id)? {
                    warn!(id = %id, "event payload omitted data; an existing repository entry is authoritative, leaving it untouched");
                    return Ok(());
                }
                warn!(id = %id, size, "event payload omitted data and no repository entry exists; reconstructing a zero-filled placeholder");
                vec![0u8; size]
            }
        };

        let now = Utc::now();
        self.repository.store(StoredResource {
            id,
            content_type,
            data,
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

impl EventHandler for ResourceEventHandler {
    fn handle(&self, envelope: &EventEnvelope) -> PodResult<()> {
        self.apply(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryResourceRepository;
    use ldp_events::{EntityType, Event};

    fn envelope(event_type: &'static str, payload: serde_json::Value) -> EventEnvelope {
        let event = Event::new(EntityType::Resource, event_type, ResourceId::new("r1").unwrap(), 1, payload);
        EventEnvelope::new(uuid::Uuid::now_v7(), Utc::now(), event)
    }

    #[test]
    fn created_event_with_embedded_data_reconstructs_exactly() {
        let repo = Arc::new(InMemoryResourceRepository::new());
        let handler = ResourceEventHandler::new(repo.clone());

        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hello");
        handler
            .handle(&envelope("resource.created", serde_json::json!({
                "contentType": "text/plain",
                "size": 5,
                "data": encoded,
            })))
            .unwrap();

        let stored = repo.retrieve(&ResourceId::new("r1").unwrap()).unwrap();
        assert_eq!(stored.data, b"hello");
    }

    #[test]
    fn oversized_event_without_repo_entry_falls_back_to_zero_fill() {
        let repo = Arc::new(InMemoryResourceRepository::new());
        let handler = ResourceEventHandler::new(repo.clone());

        handler
            .handle(&envelope("resource.created", serde_json::json!({
                "contentType": "application/octet-stream",
                "size": 10,
            })))
            .unwrap();

        let stored = repo.retrieve(&ResourceId::new("r1").unwrap()).unwrap();
        assert_eq!(stored.data, vec![0u8; 10]);
    }

    #[test]
    fn oversized_event_does_not_clobber_existing_entry() {
        let repo = Arc::new(InMemoryResourceRepository::new());
        repo.store(StoredResource {
            id: ResourceId::new("r1").unwrap(),
            content_type: "application/octet-stream".to_string(),
            data: b"already correct".to_vec(),
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .unwrap();

        let handler = ResourceEventHandler::new(repo.clone());
        handler
            .handle(&envelope("resource.updated", serde_json::json!({
                "contentType": "application/octet-stream",
                "size": 16,
            })))
            .unwrap();

        let stored = repo.retrieve(&ResourceId::new("r1").unwrap()).unwrap();
        assert_eq!(stored.data, b"already correct");
    }

    #[test]
    fn deleted_event_removes_from_repository() {
        let repo = Arc::new(InMemoryResourceRepository::new());
        let handler = ResourceEventHandler::new(repo.clone());
        handler
            .handle(&envelope("resource.created", serde_json::json!({"contentType": "text/plain", "size": 1, "data": base64::engine::general_purpose::STANDARD.encode(b"a")})))
            .unwrap();
        handler.handle(&envelope("resource.deleted", serde_json::json!({}))).unwrap();
        assert!(!repo.exists(&ResourceId::new("r1").unwrap()).unwrap());
    }

    #[test]
    fn unknown_event_type_is_not_an_error() {
        let repo = Arc::new(InMemoryResourceRepository::new());
        let handler = ResourceEventHandler::new(repo);
        assert!(handler.handle(&envelope("resource.archived", serde_json::json!({}))).is_ok());
    }
}
