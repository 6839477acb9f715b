//! Append-only event log: the durable record of every domain event.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use ldp_core::{PodError, ResourceId};
use uuid::Uuid;

use crate::envelope::{Event, EventEnvelope};

/// Append-only, per-aggregate ordered record of domain events.
///
/// Implementations must preserve append order within a single aggregate
/// stream; ordering across aggregates is not guaranteed (see the concurrency
/// model).
pub trait EventLog: Send + Sync {
    /// Append events to an aggregate's stream, assigning envelope metadata.
    /// Returns the resulting envelopes in append order.
    fn append(&self, aggregate_id: &ResourceId, events: Vec<Event>) -> Result<Vec<EventEnvelope>, PodError>;

    /// Read the full stream for an aggregate, in append order.
    fn read_stream(&self, aggregate_id: &ResourceId) -> Result<Vec<EventEnvelope>, PodError>;
}

/// In-memory append-only event log.
///
/// Reference implementation for tests and embedded use; not durable across
/// process restarts.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    streams: RwLock<HashMap<ResourceId, Vec<EventEnvelope>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, aggregate_id: &ResourceId, events: Vec<Event>) -> Result<Vec<EventEnvelope>, PodError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| PodError::storage_failed("EventLog::append", "event log lock poisoned"))?;

        let stream = streams.entry(aggregate_id.clone()).or_default();
        let mut committed = Vec::with_capacity(events.len());
        for event in events {
            let envelope = EventEnvelope::new(Uuid::now_v7(), Utc::now(), event);
            stream.push(envelope.clone());
            committed.push(envelope);
        }

        Ok(committed)
    }

    fn read_stream(&self, aggregate_id: &ResourceId) -> Result<Vec<EventEnvelope>, PodError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| PodError::storage_failed("EventLog::read_stream", "event log lock poisoned"))?;

        Ok(streams.get(aggregate_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EntityType;

    fn sample_event(id: &ResourceId) -> Event {
        Event::new(
            EntityType::Resource,
            "resource.created",
            id.clone(),
            1,
            serde_json::json!({"contentType": "text/plain", "size": 3}),
        )
    }

    #[test]
    fn append_then_read_preserves_order() {
        let log = InMemoryEventLog::new();
        let id = ResourceId::new("r1").unwrap();
        log.append(&id, vec![sample_event(&id), sample_event(&id)]).unwrap();

        let stream = log.read_stream(&id).unwrap();
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn unknown_aggregate_returns_empty_stream() {
        let log = InMemoryEventLog::new();
        let id = ResourceId::new("missing").unwrap();
        assert!(log.read_stream(&id).unwrap().is_empty());
    }

    #[test]
    fn empty_append_is_a_no_op() {
        let log = InMemoryEventLog::new();
        let id = ResourceId::new("r1").unwrap();
        assert!(log.append(&id, vec![]).unwrap().is_empty());
        assert!(log.read_stream(&id).unwrap().is_empty());
    }
}
