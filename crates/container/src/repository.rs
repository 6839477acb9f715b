//! The materialized repository for containers: current-state storage,
//! parent/child indexing, and membership sets. Written exclusively by
//! `ContainerEventHandler` (containers are purely event-sourced).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use ldp_core::{PodError, PodResult, ResourceId};

use crate::container::ContainerType;

/// Materialized current-state view of a container.
///
/// `ancestor_path` is a denormalized cache of the chain from root down to
/// (but excluding) this container's own id, kept so that cycle detection is
/// an O(1) membership check rather than a walk up the tree on every create.
#[derive(Debug, Clone)]
pub struct StoredContainer {
    pub id: ResourceId,
    pub parent_id: Option<ResourceId>,
    pub container_type: ContainerType,
    pub members: IndexSet<ResourceId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ancestor_path: Vec<ResourceId>,
}

pub trait ContainerRepository: Send + Sync {
    fn create_container(&self, container: StoredContainer) -> PodResult<()>;
    fn get_container(&self, id: &ResourceId) -> PodResult<StoredContainer>;
    fn update_container(&self, container: StoredContainer) -> PodResult<()>;
    fn delete_container(&self, id: &ResourceId) -> PodResult<()>;
    fn container_exists(&self, id: &ResourceId) -> PodResult<bool>;

    fn add_member(&self, container_id: &ResourceId, member_id: ResourceId) -> PodResult<()>;
    fn remove_member(&self, container_id: &ResourceId, member_id: &ResourceId) -> PodResult<()>;
    fn list_members(&self, container_id: &ResourceId) -> PodResult<Vec<ResourceId>>;

    fn get_children(&self, id: &ResourceId) -> PodResult<Vec<ResourceId>>;
    fn get_parent(&self, id: &ResourceId) -> PodResult<Option<ResourceId>>;

    /// The chain from root down to (but excluding) `id`. Used both for
    /// display (breadcrumbs) and for cycle detection at create time.
    fn ancestor_path(&self, id: &ResourceId) -> PodResult<Vec<ResourceId>>;
}

#[derive(Debug, Default)]
pub struct InMemoryContainerRepository {
    containers: RwLock<HashMap<ResourceId, StoredContainer>>,
}

impl InMemoryContainerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContainerRepository for InMemoryContainerRepository {
    fn create_container(&self, container: StoredContainer) -> PodResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| PodError::storage_failed("ContainerRepository::create_container", "lock poisoned"))?;
        if containers.contains_key(&container.id) {
            return Err(PodError::new(
                ldp_core::ErrorKind::ResourceAlreadyExists,
                "ContainerRepository::create_container",
                format!("container already exists: {}", container.id),
            ));
        }
        containers.insert(container.id.clone(), container);
        Ok(())
    }

    fn get_container(&self, id: &ResourceId) -> PodResult<StoredContainer> {
        let containers = self
            .containers
            .read()
            .map_err(|_| PodError::storage_failed("ContainerRepository::get_container", "lock poisoned"))?;
        containers
            .get(id)
            .cloned()
            .ok_or_else(|| PodError::not_found("ContainerRepository::get_container", id.clone()))
    }

    fn update_container(&self, container: StoredContainer) -> PodResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| PodError::storage_failed("ContainerRepository::update_container", "lock poisoned"))?;
        if !containers.contains_key(&container.id) {
            return Err(PodError::not_found("ContainerRepository::update_container", container.id.clone()));
        }
        containers.insert(container.id.clone(), container);
        Ok(())
    }

    fn delete_container(&self, id: &ResourceId) -> PodResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| PodError::storage_failed("ContainerRepository::delete_container", "lock poisoned"))?;
        containers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PodError::not_found("ContainerRepository::delete_container", id.clone()))
    }

    fn container_exists(&self, id: &ResourceId) -> PodResult<bool> {
        let containers = self
            .containers
            .read()
            .map_err(|_| PodError::storage_failed("ContainerRepository::container_exists", "lock poisoned"))?;
        Ok(containers.contains_key(id))
    }

    fn add_member(&self, container_id: &ResourceId, member_id: ResourceId) -> PodResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| PodError::storage_failed("ContainerRepository::add_member", "lock poisoned"))?;
        let container = containers
            .get_mut(container_id)
            .ok_or_else(|| PodError::not_found("ContainerRepository::add_member", container_id.clone()))?;
        container.members.insert(member_id);
        container.updated_at = Utc::now();
        Ok(())
    }

    fn remove_member(&self, container_id: &ResourceId, member_id: &ResourceId) -> PodResult<()> {
        let mut containers = self
            .containers
            .write()
            .map_err(|_| PodError::storage_failed("ContainerRepository::remove_member", "lock poisoned"))?;
        let container = containers
            .get_mut(container_id)
            .ok_or_else(|| PodError::not_found("ContainerRepository::remove_member", container_id.clone()))?;
        container.members.shift_remove(member_id);
        container.updated_at = Utc::now();
        Ok(())
    }

    fn list_members(&self, container_id: &ResourceId) -> PodResult<Vec<ResourceId>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| PodError::storage_failed("ContainerRepository::list_members", "lock poisoned"))?;
        let container = containers
            .get(container_id)
            .ok_or_else(|| PodError::not_found("ContainerRepository::list_members", container_id.clone()))?;
        Ok(container.members.iter().cloned().collect())
    }

    fn get_children(&self, id: &ResourceId) -> PodResult<Vec<ResourceId>> {
        let containers = self
            .containers
            .read()
            .map_err(|_| PodError::storage_failed("ContainerRepository::get_children", "lock poisoned"))?;
        Ok(containers
            .values()
            .filter(|c| c.parent_id.as_ref() == Some(id))
            .map(|c| c.id.clone())
            .collect())
    }

    fn get_parent(&self, id: &ResourceId) -> PodResult<Option<ResourceId>> {
        Ok(self.get_container(id)?.parent_id)
    }

    fn ancestor_path(&self, id: &ResourceId) -> PodResult<Vec<ResourceId>> {
        Ok(self.get_container(id)?.ancestor_path)
    }
}
