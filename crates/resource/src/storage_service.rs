//! Public API for resource CRUD, content negotiation, and streaming.

use std::sync::Arc;

use ldp_core::{ErrorKind, PodError, PodResult, ResourceId};
use ldp_events::{EventDispatcher, EventLog, UnitOfWork};
use ldp_format::FormatConverter;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn};

use crate::repository::{ResourceRepository, StoredResource};
use crate::resource::Resource;
use crate::streaming::ByteStream;

/// Orchestrates resource mutations and reads.
///
/// A single reader-writer lock serializes mutating calls while allowing
/// concurrent reads, per the concurrency model: writes go
/// repository-then-event (hybrid consistency), so a writer must not overlap
/// with another writer on the same instance.
pub struct StorageService {
    repository: Arc<dyn ResourceRepository>,
    event_log: Arc<dyn EventLog>,
    dispatcher: Arc<EventDispatcher>,
    lock: RwLock<()>,
}

impl StorageService {
    pub fn new(
        repository: Arc<dyn ResourceRepository>,
        event_log: Arc<dyn EventLog>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            repository,
            event_log,
            dispatcher,
            lock: RwLock::new(()),
        }
    }

    pub async fn store_resource(&self, id: ResourceId, data: Vec<u8>, content_type: &str) -> PodResult<StoredResource> {
        let _span = info_span!("store_resource", id = %id).entered();
        let _guard = self.lock.write().await;

        if ldp_core::looks_like_rdf(content_type)
            && !ldp_core::is_rdf_format(&ldp_core::normalize_content_type(content_type))
        {
            return Err(PodError::new(ErrorKind::UnsupportedFormat, "store_resource", content_type.to_string()));
        }

        let mut resource = if self.repository.exists(&id)? {
            let existing = self.repository.retrieve(&id)?;
            let mut resource = Resource::rehydrate(
                id.clone(),
                existing.data,
                existing.content_type,
                existing.metadata,
                existing.created_at,
                existing.updated_at,
            );
            resource.update(data, content_type)?;
            resource
        } else {
            Resource::create(id.clone(), data, content_type)?
        };

        self.write_through_and_commit(&mut resource)?;
        Ok(self.repository.retrieve(&id)?)
    }

    pub async fn retrieve_resource(&self, id: &ResourceId, accept_format: Option<&str>) -> PodResult<StoredResource> {
        let _span = info_span!("retrieve_resource", id = %id).entered();
        let _guard = self.lock.read().await;

        let mut stored = self.repository.retrieve(id)?;

        if let Some(format) = accept_format {
            let format = ldp_core::normalize_content_type(format);
            if !format.is_empty() && format != stored.content_type {
                let converted = FormatConverter::convert(&stored.data, &stored.content_type, &format)?;
                stored
                    .metadata
                    .insert("convertedFrom".to_string(), serde_json::json!(stored.content_type));
                stored.content_type = format;
                stored.data = converted;
            }
        }

        Ok(stored)
    }

    pub async fn delete_resource(&self, id: &ResourceId) -> PodResult<()> {
        let _span = info_span!("delete_resource", id = %id).entered();
        let _guard = self.lock.write().await;

        let existing = self.repository.retrieve(id)?;
        let mut resource = Resource::rehydrate(
            id.clone(),
            existing.data,
            existing.content_type,
            existing.metadata,
            existing.created_at,
            existing.updated_at,
        );
        resource.delete()?;

        self.repository.delete(id)?;
        self.commit(&mut resource)?;
        Ok(())
    }

    pub async fn resource_exists(&self, id: &ResourceId) -> PodResult<bool> {
        let _guard = self.lock.read().await;
        self.repository.exists(id)
    }

    pub async fn stream_resource(
        &self,
        id: &ResourceId,
        accept_format: Option<&str>,
        cancellation: CancellationToken,
    ) -> PodResult<(ByteStream, String)> {
        let stored = self.retrieve_resource(id, accept_format).await?;
        let content_type = stored.content_type.clone();
        Ok((ByteStream::from_bytes(stored.data, cancellation), content_type))
    }

    pub async fn store_resource_stream(
        &self,
        id: ResourceId,
        mut stream: ByteStream,
        content_type: &str,
    ) -> PodResult<StoredResource> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next_chunk().await {
            let chunk = chunk.map_err(|e| {
                PodError::new(ErrorKind::StreamReadFailed, "store_resource_stream", e.to_string())
            })?;
            data.extend_from_slice(&chunk);
        }
        self.store_resource(id, data, content_type).await
    }

    pub async fn link_resource(&self, id: &ResourceId, related_id: &ResourceId, relationship: &str) -> PodResult<StoredResource> {
        let _span = info_span!("link_resource", id = %id, related_id = %related_id).entered();
        let _guard = self.lock.write().await;

        if !self.repository.exists(related_id)? {
            return Err(PodError::not_found("link_resource", related_id.clone()));
        }

        let existing = self.repository.retrieve(id)?;
        let mut resource = Resource::rehydrate(
            id.clone(),
            existing.data,
            existing.content_type,
            existing.metadata,
            existing.created_at,
            existing.updated_at,
        );
        resource.link(related_id, relationship)?;

        self.write_through_and_commit(&mut resource)?;
        self.repository.retrieve(id)
    }

    /// Write the resource's current state to the repository, then commit its
    /// uncommitted events. On commit failure the repository write is *not*
    /// rolled back (hybrid consistency, see SPEC_FULL.md §5).
    fn write_through_and_commit(&self, resource: &mut Resource) -> PodResult<()> {
        let stored = StoredResource {
            id: resource.id().clone(),
            content_type: resource.content_type().to_string(),
            data: resource.data().to_vec(),
            metadata: resource.metadata().clone(),
            created_at: resource.created_at(),
            updated_at: resource.updated_at(),
        };
        self.repository.store(stored)?;
        self.commit(resource)
    }

    fn commit(&self, resource: &mut Resource) -> PodResult<()> {
        let mut uow = UnitOfWork::new(self.event_log.clone(), self.dispatcher.clone());
        uow.register_events(resource.uncommitted_events().to_vec());
        match uow.commit(resource.id()) {
            Ok(_) => {
                resource.mark_events_as_committed();
                Ok(())
            }
            Err(err) => {
                warn!(id = %resource.id(), error = %err, "event commit failed; repository write (if any) was not rolled back");
                Err(err)
            }
        }
    }
}
