//! Public API for container lifecycle, membership, hierarchy, and rendering.
//!
//! Unlike `StorageService`, this service never writes the materialized
//! repository directly: every mutation only registers events on a
//! `UnitOfWork` and commits them. The repository is reconciled exclusively
//! by `ContainerEventHandler` subscribed to `container.*` events.

use std::sync::Arc;

use ldp_core::{Pagination, PodError, PodResult, ResourceId};
use ldp_events::{EventDispatcher, EventLog, UnitOfWork};
use ldp_format::FormatConverter;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info_span;

use crate::container::{Container, ContainerType};
use crate::hierarchy_engine::{Breadcrumb, ContainerTypeInfo, HierarchyEngine, ResolvedPath, StructureInfo};
use crate::repository::{ContainerRepository, StoredContainer};

pub struct MemberPage {
    pub container_id: ResourceId,
    pub members: Vec<ResourceId>,
    pub pagination: Pagination,
    pub total_count: usize,
}

pub struct ContainerService {
    repository: Arc<dyn ContainerRepository>,
    event_log: Arc<dyn EventLog>,
    dispatcher: Arc<EventDispatcher>,
    hierarchy: HierarchyEngine,
    lock: RwLock<()>,
}

impl ContainerService {
    pub fn new(repository: Arc<dyn ContainerRepository>, event_log: Arc<dyn EventLog>, dispatcher: Arc<EventDispatcher>) -> Self {
        let hierarchy = HierarchyEngine::new(repository.clone());
        Self {
            repository,
            event_log,
            dispatcher,
            hierarchy,
            lock: RwLock::new(()),
        }
    }

    /// Create the root container (`/`). Only the initialization service is
    /// expected to call this; it is exempted from the parent-must-exist check.
    pub async fn create_root(&self) -> PodResult<()> {
        let _guard = self.lock.write().await;
        if self.repository.container_exists(&ResourceId::root())? {
            return Ok(());
        }
        let mut container = Container::create_root();
        self.commit(&mut container).await
    }

    pub async fn create_container(&self, id: ResourceId, parent_id: ResourceId, container_type: ContainerType) -> PodResult<()> {
        let _span = info_span!("create_container", id = %id, parent_id = %parent_id).entered();
        let _guard = self.lock.write().await;

        if self.repository.container_exists(&id)? {
            return Err(PodError::new(
                ldp_core::ErrorKind::ResourceAlreadyExists,
                "create_container",
                format!("container already exists: {id}"),
            ));
        }
        if !self.repository.container_exists(&parent_id)? {
            return Err(PodError::not_found("create_container", parent_id.clone()));
        }

        let ancestor_path = self.repository.ancestor_path(&parent_id)?;
        if ancestor_path.contains(&id) || parent_id == id {
            return Err(PodError::invalid_hierarchy(
                "create_container",
                format!("creating {id} under {parent_id} would introduce a cycle"),
            ));
        }

        let mut container = Container::create(id, parent_id, container_type)?;
        self.commit(&mut container).await
    }

    pub async fn get_container(&self, id: &ResourceId) -> PodResult<StoredContainer> {
        let _guard = self.lock.read().await;
        self.repository.get_container(id)
    }

    pub async fn update_container(&self, id: &ResourceId, title: Option<String>, description: Option<String>) -> PodResult<()> {
        let _guard = self.lock.write().await;
        let stored = self.repository.get_container(id)?;
        let mut container = rehydrate(stored);
        container.set_title(title);
        container.set_description(description);
        self.commit(&mut container).await
    }

    pub async fn delete_container(&self, id: &ResourceId) -> PodResult<()> {
        let _span = info_span!("delete_container", id = %id).entered();
        let _guard = self.lock.write().await;

        if !self.repository.get_children(id)?.is_empty() {
            return Err(PodError::container_not_empty("delete_container", id.clone()));
        }

        let stored = self.repository.get_container(id)?;
        let mut container = rehydrate(stored);
        container.delete()?;
        self.commit(&mut container).await
    }

    pub async fn add_resource(&self, container_id: &ResourceId, member_id: ResourceId, member_type: &str) -> PodResult<()> {
        let _guard = self.lock.write().await;
        let stored = self.repository.get_container(container_id)?;
        let mut container = rehydrate(stored);
        container.add_member(member_id, member_type);
        self.commit(&mut container).await
    }

    pub async fn remove_resource(&self, container_id: &ResourceId, member_id: &ResourceId) -> PodResult<()> {
        let _guard = self.lock.write().await;
        let stored = self.repository.get_container(container_id)?;
        let mut container = rehydrate(stored);
        container.remove_member(member_id)?;
        self.commit(&mut container).await
    }

    pub async fn list_container_members(&self, id: &ResourceId, pagination: Pagination) -> PodResult<MemberPage> {
        let _guard = self.lock.read().await;
        let pagination = pagination.normalized();
        let all = self.repository.list_members(id)?;
        let total_count = all.len();
        let members = all
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(MemberPage {
            container_id: id.clone(),
            members,
            pagination,
            total_count,
        })
    }

    pub async fn get_container_path(&self, id: &ResourceId) -> PodResult<String> {
        let _guard = self.lock.read().await;
        let crumbs = self.hierarchy.generate_breadcrumbs(id)?;
        Ok(crumbs.last().map(|c| c.path.clone()).unwrap_or_default())
    }

    pub async fn find_container_by_path(&self, path: &str) -> PodResult<ResolvedPath> {
        let _guard = self.lock.read().await;
        self.hierarchy.resolve_container_path(path)
    }

    pub async fn get_children(&self, id: &ResourceId) -> PodResult<Vec<ResourceId>> {
        let _guard = self.lock.read().await;
        self.repository.get_children(id)
    }

    pub async fn get_parent(&self, id: &ResourceId) -> PodResult<Option<ResourceId>> {
        let _guard = self.lock.read().await;
        self.repository.get_parent(id)
    }

    pub async fn container_exists(&self, id: &ResourceId) -> PodResult<bool> {
        let _guard = self.lock.read().await;
        self.repository.container_exists(id)
    }

    pub async fn generate_breadcrumbs(&self, id: &ResourceId) -> PodResult<Vec<Breadcrumb>> {
        let _guard = self.lock.read().await;
        self.hierarchy.generate_breadcrumbs(id)
    }

    pub async fn resolve_container_path(&self, path: &str) -> PodResult<ResolvedPath> {
        let _guard = self.lock.read().await;
        self.hierarchy.resolve_container_path(path)
    }

    pub async fn get_container_type_info(&self, id: &ResourceId) -> PodResult<ContainerTypeInfo> {
        let _guard = self.lock.read().await;
        self.hierarchy.get_container_type_info(id)
    }

    pub async fn generate_structure_info(
        &self,
        id: &ResourceId,
        depth: u32,
        cancellation: CancellationToken,
    ) -> PodResult<StructureInfo> {
        let _guard = self.lock.read().await;
        self.hierarchy.generate_structure_info(id, depth, &cancellation)
    }

    pub async fn get_container_with_format(&self, id: &ResourceId, format: &str, base_uri: &str) -> PodResult<Vec<u8>> {
        let stored = self.get_container(id).await?;
        let member_ids: Vec<String> = stored.members.iter().map(|m| m.as_str().to_string()).collect();
        FormatConverter::render_container(format, base_uri, stored.id.as_str(), stored.title.as_deref(), &member_ids)
    }

    pub async fn list_container_members_with_format(
        &self,
        id: &ResourceId,
        format: &str,
        base_uri: &str,
        pagination: Pagination,
    ) -> PodResult<Vec<u8>> {
        let stored = self.get_container(id).await?;
        let page = self.list_container_members(id, pagination).await?;
        let member_ids: Vec<String> = page.members.iter().map(|m| m.as_str().to_string()).collect();
        FormatConverter::render_container(format, base_uri, stored.id.as_str(), stored.title.as_deref(), &member_ids)
    }

    async fn commit(&self, container: &mut Container) -> PodResult<()> {
        let mut uow = UnitOfWork::new(self.event_log.clone(), self.dispatcher.clone());
        uow.register_events(container.uncommitted_events().to_vec());
        uow.commit(container.id())?;
        container.mark_events_as_committed();
        Ok(())
    }
}

fn rehydrate(stored: StoredContainer) -> Container {
    Container::rehydrate(
        stored.id,
        stored.parent_id,
        stored.container_type,
        stored.members,
        stored.title,
        stored.description,
        stored.created_at,
        stored.updated_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_handler::ContainerEventHandler;
    use crate::repository::InMemoryContainerRepository;
    use ldp_events::InMemoryEventLog;

    fn service_with_handler() -> (ContainerService, Arc<InMemoryContainerRepository>) {
        let repo = Arc::new(InMemoryContainerRepository::new());
        let log: Arc<dyn EventLog> = Arc::new(InMemoryEventLog::new());
        let dispatcher = Arc::new(EventDispatcher::new());
        dispatcher.subscribe_all(Arc::new(ContainerEventHandler::new(repo.clone()))).unwrap();
        let service = ContainerService::new(repo.clone(), log, dispatcher);
        (service, repo)
    }

    #[tokio::test]
    async fn create_root_then_child_links_parent() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        svc.create_container(ResourceId::new("docs").unwrap(), ResourceId::root(), ContainerType::BasicContainer)
            .await
            .unwrap();

        let children = svc.get_children(&ResourceId::root()).await.unwrap();
        assert_eq!(children, vec![ResourceId::new("docs").unwrap()]);
    }

    #[tokio::test]
    async fn create_container_under_missing_parent_fails() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        let result = svc
            .create_container(ResourceId::new("a").unwrap(), ResourceId::new("ghost").unwrap(), ContainerType::BasicContainer)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_container_self_parent_is_rejected_as_cycle() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        svc.create_container(ResourceId::new("docs").unwrap(), ResourceId::root(), ContainerType::BasicContainer)
            .await
            .unwrap();
        let result = svc
            .create_container(ResourceId::new("docs").unwrap(), ResourceId::new("docs").unwrap(), ContainerType::BasicContainer)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_with_children_fails() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        svc.create_container(ResourceId::new("docs").unwrap(), ResourceId::root(), ContainerType::BasicContainer)
            .await
            .unwrap();
        assert!(svc.delete_container(&ResourceId::root()).await.is_err());
    }

    #[tokio::test]
    async fn add_then_list_members_paginates() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        svc.add_resource(&ResourceId::root(), ResourceId::new("a.txt").unwrap(), "resource")
            .await
            .unwrap();
        svc.add_resource(&ResourceId::root(), ResourceId::new("b.txt").unwrap(), "resource")
            .await
            .unwrap();

        let page = svc.list_container_members(&ResourceId::root(), Pagination::new(1, 0)).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.members.len(), 1);
    }

    #[tokio::test]
    async fn render_container_with_format_includes_member() {
        let (svc, _repo) = service_with_handler();
        svc.create_root().await.unwrap();
        svc.add_resource(&ResourceId::root(), ResourceId::new("a.txt").unwrap(), "resource")
            .await
            .unwrap();

        let rendered = svc
            .get_container_with_format(&ResourceId::root(), "text/turtle", "http://pod.example/")
            .await
            .unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.contains("a.txt"));
    }
}
