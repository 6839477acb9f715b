//! The `Resource` entity: byte payload, media type, and relationship metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ldp_core::{normalize_content_type, AggregateRoot, Entity, PodError, PodResult, ResourceId};
use ldp_events::{EntityType, Event};
use serde_json::{json, Value};

/// A stored byte payload addressed by [`ResourceId`].
///
/// Mutators (`update`, `delete`, `link`) append to `uncommitted_events`
/// rather than mutate durable state directly; the storage service is
/// responsible for persisting `data`/`metadata` to the repository and for
/// committing the events through a [`ldp_events::UnitOfWork`].
#[derive(Debug, Clone)]
pub struct Resource {
    id: ResourceId,
    content_type: String,
    data: Vec<u8>,
    metadata: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    deleted: bool,
    uncommitted_events: Vec<Event>,
}

/// Bytes above this size are omitted from event payloads (see
/// `ResourceEventHandler`'s reconstruction policy).
pub const EVENT_EMBED_THRESHOLD_BYTES: usize = 64 * 1024;

impl Resource {
    /// Rehydrate an in-memory entity from a materialized repository row,
    /// with no uncommitted events and no re-validation of already-stored
    /// state. Used by the service to load an existing resource before
    /// applying a further mutator (`update`, `delete`, `link`).
    pub fn rehydrate(
        id: ResourceId,
        data: Vec<u8>,
        content_type: String,
        metadata: BTreeMap<String, Value>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content_type,
            data,
            metadata,
            created_at,
            updated_at,
            version: 0,
            deleted: false,
            uncommitted_events: Vec::new(),
        }
    }

    /// Construct a new resource, emitting `resource.created`.
    pub fn create(id: ResourceId, data: Vec<u8>, content_type: impl Into<String>) -> PodResult<Self> {
        if data.is_empty() {
            return Err(PodError::invalid_resource("Resource::create", "data must not be empty"));
        }

        let content_type = normalize_content_type(&content_type.into());
        let now = Utc::now();
        let mut resource = Self {
            id,
            content_type,
            data,
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            version: 0,
            deleted: false,
            uncommitted_events: Vec::new(),
        };

        let payload = resource.created_payload(now);
        resource.push_event("resource.created", payload);
        Ok(resource)
    }

    /// Mutate an existing resource's payload, emitting `resource.updated`.
    pub fn update(&mut self, data: Vec<u8>, content_type: impl Into<String>) -> PodResult<()> {
        if data.is_empty() {
            return Err(PodError::invalid_resource("Resource::update", "data must not be empty"));
        }
        if self.deleted {
            return Err(PodError::not_found("Resource::update", self.id.clone()));
        }

        self.content_type = normalize_content_type(&content_type.into());
        self.data = data;
        self.updated_at = Utc::now();

        let payload = self.created_payload(self.updated_at);
        self.push_event("resource.updated", payload);
        Ok(())
    }

    /// Mark the resource deleted, emitting `resource.deleted`.
    pub fn delete(&mut self) -> PodResult<()> {
        if self.deleted {
            return Err(PodError::not_found("Resource::delete", self.id.clone()));
        }
        self.deleted = true;
        let now = Utc::now();
        self.updated_at = now;
        self.push_event("resource.deleted", json!({ "deletedAt": now }));
        Ok(())
    }

    /// Establish a named, directed relationship to another resource,
    /// emitting `resource.linked`. Idempotent against the same target, but
    /// still emits an event each call (see the operation's doc in
    /// SPEC_FULL.md: linking is a named-edge upsert, not a set add).
    pub fn link(&mut self, related_id: &ResourceId, relationship: &str) -> PodResult<()> {
        if self.deleted {
            return Err(PodError::not_found("Resource::link", self.id.clone()));
        }

        let relationships = self
            .metadata
            .entry("relationships".to_string())
            .or_insert_with(|| json!({}));

        let already_exists = relationships
            .get(relationship)
            .and_then(Value::as_str)
            .map(|existing| existing == related_id.as_str())
            .unwrap_or(false);

        if !already_exists {
            relationships
                .as_object_mut()
                .expect("relationships is always an object")
                .insert(relationship.to_string(), json!(related_id.as_str()));
        }

        let now = Utc::now();
        self.updated_at = now;
        self.push_event(
            "resource.linked",
            json!({
                "linkedResourceID": related_id.as_str(),
                "relationship": relationship,
                "alreadyExists": already_exists,
                "linkedAt": now,
            }),
        );
        Ok(())
    }

    fn push_event(&mut self, event_type: &'static str, payload: Value) {
        self.version += 1;
        self.uncommitted_events.push(Event::new(
            EntityType::Resource,
            event_type,
            self.id.clone(),
            1,
            payload,
        ));
    }

    fn created_payload(&self, at: DateTime<Utc>) -> Value {
        let mut payload = json!({
            "contentType": self.content_type,
            "size": self.data.len(),
            "createdAt": at,
            "updatedAt": at,
        });
        if self.data.len() <= EVENT_EMBED_THRESHOLD_BYTES {
            payload["data"] = json!(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &self.data
            ));
        }
        payload
    }

    pub fn uncommitted_events(&self) -> &[Event] {
        &self.uncommitted_events
    }

    pub fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Inherent accessor so callers don't need `Entity`/`AggregateRoot` in
    /// scope just to read the id (both traits declare `id()` with the same
    /// signature, which would otherwise be ambiguous to resolve).
    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

impl Entity for Resource {
    type Id = ResourceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Resource {
    type Id = ResourceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
