//! The materialized repository for resources: current-state storage,
//! consulted directly by reads and written by the hybrid-consistency write
//! path (the service writes it directly; `ResourceEventHandler` also writes
//! it when reconciling dispatched events).

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use ldp_core::{PodError, PodResult, ResourceId};
use serde_json::Value;

/// Materialized current-state view of a resource.
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub id: ResourceId,
    pub content_type: String,
    pub data: Vec<u8>,
    pub metadata: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Current-state store for resources.
pub trait ResourceRepository: Send + Sync {
    fn store(&self, resource: StoredResource) -> PodResult<()>;
    fn retrieve(&self, id: &ResourceId) -> PodResult<StoredResource>;
    fn delete(&self, id: &ResourceId) -> PodResult<()>;
    fn exists(&self, id: &ResourceId) -> PodResult<bool>;
}

/// In-memory reference implementation; not durable across process restarts.
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    resources: RwLock<HashMap<ResourceId, StoredResource>>,
}

impl InMemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceRepository for InMemoryResourceRepository {
    fn store(&self, resource: StoredResource) -> PodResult<()> {
        let mut resources = self
            .resources
            .write()
            .map_err(|_| PodError::storage_failed("ResourceRepository::store", "lock poisoned"))?;
        resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    fn retrieve(&self, id: &ResourceId) -> PodResult<StoredResource> {
        let resources = self
            .resources
            .read()
            .map_err(|_| PodError::storage_failed("ResourceRepository::retrieve", "lock poisoned"))?;
        resources
            .get(id)
            .cloned()
            .ok_or_else(|| PodError::not_found("ResourceRepository::retrieve", id.clone()))
    }

    fn delete(&self, id: &ResourceId) -> PodResult<()> {
        let mut resources = self
            .resources
            .write()
            .map_err(|_| PodError::storage_failed("ResourceRepository::delete", "lock poisoned"))?;
        resources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PodError::not_found("ResourceRepository::delete", id.clone()))
    }

    fn exists(&self, id: &ResourceId) -> PodResult<bool> {
        let resources = self
            .resources
            .read()
            .map_err(|_| PodError::storage_failed("ResourceRepository::exists", "lock poisoned"))?;
        Ok(resources.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> StoredResource {
        let now = Utc::now();
        StoredResource {
            id: ResourceId::new(id).unwrap(),
            content_type: "text/plain".to_string(),
            data: b"hi".to_vec(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn store_then_retrieve_round_trips() {
        let repo = InMemoryResourceRepository::new();
        repo.store(sample("r1")).unwrap();
        let got = repo.retrieve(&ResourceId::new("r1").unwrap()).unwrap();
        assert_eq!(got.data, b"hi");
    }

    #[test]
    fn delete_then_retrieve_fails() {
        let repo = InMemoryResourceRepository::new();
        repo.store(sample("r1")).unwrap();
        let id = ResourceId::new("r1").unwrap();
        repo.delete(&id).unwrap();
        assert!(repo.retrieve(&id).is_err());
    }

    #[test]
    fn delete_missing_fails() {
        let repo = InMemoryResourceRepository::new();
        assert!(repo.delete(&ResourceId::new("missing").unwrap()).is_err());
    }
}
