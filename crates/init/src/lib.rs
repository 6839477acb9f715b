//! Bootstraps the pod: ensures the root container exists and validates the
//! invariants that every other service assumes hold for `/`.

use std::sync::Arc;

use ldp_container::{ContainerService, ContainerType};
use ldp_core::{PodError, PodResult, ResourceId};
use tracing::info;

pub struct InitializationService {
    container_service: Arc<ContainerService>,
}

impl InitializationService {
    pub fn new(container_service: Arc<ContainerService>) -> Self {
        Self { container_service }
    }

    /// Ensure the root container (`/`) exists, creating it through the
    /// normal event-sourced path if absent. Idempotent: a pre-existing root
    /// is left untouched.
    pub async fn bootstrap(&self) -> PodResult<()> {
        if self.container_service.container_exists(&ResourceId::root()).await? {
            info!("root container already exists; skipping bootstrap");
            return Ok(());
        }

        info!("bootstrapping root container");
        self.container_service.create_root().await
    }

    /// Validate that the root container exists, has no parent, and is a
    /// `BasicContainer`, as every other service in this workspace assumes.
    pub async fn validate_system_state(&self) -> PodResult<()> {
        let root = self.container_service.get_container(&ResourceId::root()).await?;

        if root.parent_id.is_some() {
            return Err(PodError::invalid_hierarchy(
                "validate_system_state",
                "root container must not have a parent",
            ));
        }
        if root.container_type != ContainerType::BasicContainer {
            return Err(PodError::invalid_hierarchy(
                "validate_system_state",
                "root container must be a BasicContainer",
            ));
        }

        Ok(())
    }
}
