//! The `Container` entity: an LDP BasicContainer node in the pod tree.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use ldp_core::{AggregateRoot, Entity, PodError, PodResult, ResourceId};
use ldp_events::{EntityType, Event};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ContainerType {
    BasicContainer,
    DirectContainer,
    IndirectContainer,
}

impl ContainerType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerType::BasicContainer => "BasicContainer",
            ContainerType::DirectContainer => "DirectContainer",
            ContainerType::IndirectContainer => "IndirectContainer",
        }
    }
}

/// A container node: a resource specialization with a parent link and an
/// ordered, duplicate-free membership set.
///
/// Containers are **purely event-sourced**: unlike `Resource`, this entity's
/// mutators only ever produce events; no caller of this type writes the
/// materialized repository directly (see `ContainerEventHandler`, the sole
/// repository writer on the container write path).
#[derive(Debug, Clone)]
pub struct Container {
    id: ResourceId,
    parent_id: Option<ResourceId>,
    container_type: ContainerType,
    members: IndexSet<ResourceId>,
    title: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    deleted: bool,
    uncommitted_events: Vec<Event>,
}

impl Container {
    /// Construct the root container (`id == "/"`, no parent).
    pub fn create_root() -> Self {
        Self::create_inner(ResourceId::root(), None, ContainerType::BasicContainer, true)
    }

    /// Construct a non-root container under `parent_id`, emitting `container.created`.
    pub fn create(id: ResourceId, parent_id: ResourceId, container_type: ContainerType) -> PodResult<Self> {
        if id.is_root() {
            return Err(PodError::invalid_id("Container::create", "id \"/\" is reserved for the root container"));
        }
        Ok(Self::create_inner(id, Some(parent_id), container_type, false))
    }

    fn create_inner(id: ResourceId, parent_id: Option<ResourceId>, container_type: ContainerType, is_root: bool) -> Self {
        let now = Utc::now();
        let mut container = Self {
            id,
            parent_id,
            container_type,
            members: IndexSet::new(),
            title: None,
            description: None,
            created_at: now,
            updated_at: now,
            version: 0,
            deleted: false,
            uncommitted_events: Vec::new(),
        };

        let payload = json!({
            "parentID": container.parent_id.as_ref().map(ResourceId::as_str).unwrap_or(""),
            "containerType": container.container_type.as_str(),
            "isRoot": is_root,
            "createdAt": now,
        });
        container.push_event("container.created", payload);
        container
    }

    /// Rehydrate from a materialized repository row, with no uncommitted events.
    pub fn rehydrate(
        id: ResourceId,
        parent_id: Option<ResourceId>,
        container_type: ContainerType,
        members: IndexSet<ResourceId>,
        title: Option<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            parent_id,
            container_type,
            members,
            title,
            description,
            created_at,
            updated_at,
            version: 0,
            deleted: false,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
        self.updated_at = Utc::now();
        let payload = json!({ "title": self.title, "updatedAt": self.updated_at });
        self.push_event("container.updated", payload);
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
        let payload = json!({ "description": self.description, "updatedAt": self.updated_at });
        self.push_event("container.updated", payload);
    }

    /// Emits `container.deleted` if the container has no members. Whether it
    /// has child containers is validated by the service (this entity has no
    /// view of the container tree).
    pub fn delete(&mut self) -> PodResult<()> {
        if !self.members.is_empty() {
            return Err(PodError::container_not_empty("Container::delete", self.id.clone()));
        }
        self.deleted = true;
        let now = Utc::now();
        self.push_event("container.deleted", json!({ "deletedAt": now }));
        Ok(())
    }

    /// Add a member id, idempotently: already-present members emit no event.
    pub fn add_member(&mut self, member_id: ResourceId, member_type: &str) {
        if self.members.contains(&member_id) {
            return;
        }
        self.members.insert(member_id.clone());
        let now = Utc::now();
        self.updated_at = now;
        self.push_event(
            "container.member_added",
            json!({ "memberID": member_id.as_str(), "memberType": member_type, "addedAt": now }),
        );
    }

    /// Remove a member id. Fails if the member is not present.
    pub fn remove_member(&mut self, member_id: &ResourceId) -> PodResult<()> {
        if !self.members.shift_remove(member_id) {
            return Err(PodError::not_found("Container::remove_member", member_id.clone()));
        }
        let now = Utc::now();
        self.updated_at = now;
        self.push_event(
            "container.member_removed",
            json!({ "memberID": member_id.as_str(), "removedAt": now }),
        );
        Ok(())
    }

    fn push_event(&mut self, event_type: &'static str, payload: serde_json::Value) {
        self.version += 1;
        self.uncommitted_events.push(Event::new(EntityType::Container, event_type, self.id.clone(), 1, payload));
    }

    pub fn uncommitted_events(&self) -> &[Event] {
        &self.uncommitted_events
    }

    pub fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    pub fn parent_id(&self) -> Option<&ResourceId> {
        self.parent_id.as_ref()
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    pub fn members(&self) -> &IndexSet<ResourceId> {
        &self.members
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Inherent accessor so callers don't need `Entity`/`AggregateRoot` in
    /// scope just to read the id (both traits declare `id()` with the same
    /// signature, which would otherwise be ambiguous to resolve).
    pub fn id(&self) -> &ResourceId {
        &self.id
    }
}

impl Entity for Container {
    type Id = ResourceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl AggregateRoot for Container {
    type Id = ResourceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
