//! Scenario 1 (root bootstrap): initializing an empty repository creates
//! the root container, and system-state validation passes afterward.

use std::sync::Arc;

use ldp_container::{ContainerEventHandler, ContainerService, ContainerType, InMemoryContainerRepository};
use ldp_core::ResourceId;
use ldp_events::{EventDispatcher, EventLog, InMemoryEventLog};
use ldp_init::InitializationService;

fn container_service() -> Arc<ContainerService> {
    let repo = Arc::new(InMemoryContainerRepository::new());
    let log: Arc<dyn EventLog> = Arc::new(InMemoryEventLog::new());
    let dispatcher = Arc::new(EventDispatcher::new());
    dispatcher.subscribe_all(Arc::new(ContainerEventHandler::new(repo.clone()))).unwrap();
    Arc::new(ContainerService::new(repo, log, dispatcher))
}

#[tokio::test]
async fn root_bootstrap_on_empty_repository() {
    let container_service = container_service();
    let init = InitializationService::new(container_service.clone());

    init.bootstrap().await.unwrap();

    let root = container_service.get_container(&ResourceId::root()).await.unwrap();
    assert_eq!(root.container_type, ContainerType::BasicContainer);
    assert!(root.parent_id.is_none());
    assert!(root.members.is_empty());

    init.validate_system_state().await.unwrap();
}
