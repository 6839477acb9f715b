//! `ContainerEventHandler`: the sole writer of the materialized container
//! repository. Containers are purely event-sourced (SPEC_FULL.md §5): no
//! service call ever writes this repository directly, so this handler must
//! be subscribed before any `ContainerService` call is made.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexSet;
use ldp_core::{PodResult, ResourceId};
use ldp_events::{EventEnvelope, EventHandler};

use crate::container::ContainerType;
use crate::repository::{ContainerRepository, StoredContainer};

pub struct ContainerEventHandler {
    repository: Arc<dyn ContainerRepository>,
}

impl ContainerEventHandler {
    pub fn new(repository: Arc<dyn ContainerRepository>) -> Self {
        Self { repository }
    }

    fn apply(&self, envelope: &EventEnvelope) -> PodResult<()> {
        let event = envelope.event();
        match event.event_type {
            "container.created" => self.apply_created(&event.aggregate_id, &event.payload),
            "container.updated" => self.apply_updated(&event.aggregate_id, &event.payload),
            "container.deleted" => match self.repository.delete_container(&event.aggregate_id) {
                Ok(()) => Ok(()),
                Err(_) => Ok(()),
            },
            "container.member_added" => self.apply_member_added(&event.aggregate_id, &event.payload),
            "container.member_removed" => self.apply_member_removed(&event.aggregate_id, &event.payload),
            other => {
                tracing::debug!(event_type = other, "unknown container event type; dropped for forward compatibility");
                Ok(())
            }
        }
    }

    fn apply_created(&self, id: &ResourceId, payload: &serde_json::Value) -> PodResult<()> {
        let parent_id = payload
            .get("parentID")
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(|s| ResourceId::new(s))
            .transpose()?;

        let ancestor_path = match &parent_id {
            None => Vec::new(),
            Some(parent_id) => {
                let mut path = self.repository.ancestor_path(parent_id).unwrap_or_default();
                path.push(parent_id.clone());
                path
            }
        };

        let container_type = match payload.get("containerType").and_then(serde_json::Value::as_str) {
            Some("DirectContainer") => ContainerType::DirectContainer,
            Some("IndirectContainer") => ContainerType::IndirectContainer,
            _ => ContainerType::BasicContainer,
        };

        let now = Utc::now();
        self.repository.create_container(StoredContainer {
            id: id.clone(),
            parent_id,
            container_type,
            members: IndexSet::new(),
            title: None,
            description: None,
            created_at: now,
            updated_at: now,
            ancestor_path,
        })
    }

    fn apply_updated(&self, id: &ResourceId, payload: &serde_json::Value) -> PodResult<()> {
        let mut stored = self.repository.get_container(id)?;
        if let Some(title) = payload.get("title") {
            stored.title = title.as_str().map(str::to_string);
        }
        if let Some(description) = payload.get("description") {
            stored.description = description.as_str().map(str::to_string);
        }
        stored.updated_at = Utc::now();
        self.repository.update_container(stored)
    }

    fn apply_member_added(&self, container_id: &ResourceId, payload: &serde_json::Value) -> PodResult<()> {
        let member_id = payload
            .get("memberID")
            .and_then(serde_json::Value::as_str)
            .map(ResourceId::new)
            .transpose()?
            .ok_or_else(|| ldp_core::PodError::invalid_resource("ContainerEventHandler::apply_member_added", "missing memberID"))?;
        self.repository.add_member(container_id, member_id)
    }

    fn apply_member_removed(&self, container_id: &ResourceId, payload: &serde_json::Value) -> PodResult<()> {
        let member_id = payload
            .get("memberID")
            .and_then(serde_json::Value::as_str)
            .map(ResourceId::new)
            .transpose()?
            .ok_or_else(|| ldp_core::PodError::invalid_resource("ContainerEventHandler::apply_member_removed", "missing memberID"))?;
        match self.repository.remove_member(container_id, &member_id) {
            Ok(()) => Ok(()),
            Err(_) => Ok(()),
        }
    }
}

impl EventHandler for ContainerEventHandler {
    fn handle(&self, envelope: &EventEnvelope) -> PodResult<()> {
        self.apply(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryContainerRepository;
    use ldp_events::{EntityType, Event};

    fn envelope(id: &str, event_type: &'static str, payload: serde_json::Value) -> EventEnvelope {
        let event = Event::new(EntityType::Container, event_type, ResourceId::new(id).unwrap(), 1, payload);
        EventEnvelope::new(uuid::Uuid::now_v7(), Utc::now(), event)
    }

    #[test]
    fn created_event_materializes_container_with_ancestor_path() {
        let repo = Arc::new(InMemoryContainerRepository::new());
        let handler = ContainerEventHandler::new(repo.clone());

        handler
            .handle(&envelope("/", "container.created", serde_json::json!({"parentID": "", "containerType": "BasicContainer", "isRoot": true})))
            .unwrap();
        handler
            .handle(&envelope("docs", "container.created", serde_json::json!({"parentID": "/", "containerType": "BasicContainer", "isRoot": false})))
            .unwrap();

        let docs = repo.get_container(&ResourceId::new("docs").unwrap()).unwrap();
        assert_eq!(docs.ancestor_path, vec![ResourceId::root()]);
    }

    #[test]
    fn member_added_then_removed_round_trips() {
        let repo = Arc::new(InMemoryContainerRepository::new());
        let handler = ContainerEventHandler::new(repo.clone());
        handler
            .handle(&envelope("/", "container.created", serde_json::json!({"parentID": "", "containerType": "BasicContainer", "isRoot": true})))
            .unwrap();

        handler
            .handle(&envelope("/", "container.member_added", serde_json::json!({"memberID": "a.txt", "memberType": "resource"})))
            .unwrap();
        assert_eq!(repo.list_members(&ResourceId::root()).unwrap(), vec![ResourceId::new("a.txt").unwrap()]);

        handler
            .handle(&envelope("/", "container.member_removed", serde_json::json!({"memberID": "a.txt"})))
            .unwrap();
        assert!(repo.list_members(&ResourceId::root()).unwrap().is_empty());
    }

    #[test]
    fn deleted_event_removes_from_repository() {
        let repo = Arc::new(InMemoryContainerRepository::new());
        let handler = ContainerEventHandler::new(repo.clone());
        handler
            .handle(&envelope("/", "container.created", serde_json::json!({"parentID": "", "containerType": "BasicContainer", "isRoot": true})))
            .unwrap();
        handler.handle(&envelope("/", "container.deleted", serde_json::json!({}))).unwrap();
        assert!(!repo.container_exists(&ResourceId::root()).unwrap());
    }
}
