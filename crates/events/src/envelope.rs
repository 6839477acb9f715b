use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ldp_core::ResourceId;

/// A single domain event, pre-serialization.
///
/// This is the **unit of persistence**: what gets appended to the event log
/// and handed to the dispatcher. Unlike the teacher's generic `EventEnvelope<E>`,
/// the payload here is concrete JSON — every consumer in this crate (the log,
/// the dispatcher, the handlers) already operates on events at the JSON
/// boundary, so keeping the payload generic would only move the `serde_json`
/// conversion from one call site to many.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub entity_type: EntityType,
    pub event_type: &'static str,
    pub aggregate_id: ResourceId,
    pub version: u32,
    pub payload: serde_json::Value,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Resource,
    Container,
}

impl Event {
    pub fn new(
        entity_type: EntityType,
        event_type: &'static str,
        aggregate_id: ResourceId,
        version: u32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            entity_type,
            event_type,
            aggregate_id,
            version,
            payload,
        }
    }
}

/// An [`Event`] wrapped with delivery metadata, produced by the event log on commit.
///
/// Envelopes separate **infrastructure concerns** (identity, ordering, delivery
/// timestamp) from **domain concerns** (the event itself). Only the event log
/// constructs envelopes; services and entities deal exclusively in [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: Uuid,
    timestamp: DateTime<Utc>,
    event: Event,
    metadata: std::collections::BTreeMap<String, String>,
}

impl EventEnvelope {
    pub fn new(event_id: Uuid, timestamp: DateTime<Utc>, event: Event) -> Self {
        Self {
            event_id,
            timestamp,
            event,
            metadata: std::collections::BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn metadata(&self) -> &std::collections::BTreeMap<String, String> {
        &self.metadata
    }
}
