//! Read-only hierarchy traversal: breadcrumbs, path resolution, and bounded
//! subtree structure info. Kept separate from `ContainerService` because
//! none of these operations mutate state or touch the event pipeline.

use std::sync::Arc;

use ldp_core::{PodError, PodResult, ResourceId};
use tokio_util::sync::CancellationToken;

use crate::container::ContainerType;
use crate::repository::ContainerRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub id: ResourceId,
    pub title: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub container: Option<ResolvedContainer>,
    pub path: String,
    pub exists: bool,
    pub is_container: bool,
    pub breadcrumbs: Vec<Breadcrumb>,
}

#[derive(Debug, Clone)]
pub struct ResolvedContainer {
    pub id: ResourceId,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub id: ResourceId,
}

#[derive(Debug, Clone)]
pub struct StructureInfo {
    pub id: ResourceId,
    pub title: Option<String>,
    pub depth: u32,
    pub members: Vec<MemberInfo>,
    pub children: Vec<StructureInfo>,
}

pub struct HierarchyEngine {
    repository: Arc<dyn ContainerRepository>,
}

impl HierarchyEngine {
    pub fn new(repository: Arc<dyn ContainerRepository>) -> Self {
        Self { repository }
    }

    /// Ancestor chain from root down to `id`, inclusive of `id` itself.
    pub fn generate_breadcrumbs(&self, id: &ResourceId) -> PodResult<Vec<Breadcrumb>> {
        let container = self.repository.get_container(id)?;
        let mut chain: Vec<ResourceId> = container.ancestor_path.clone();
        chain.push(id.clone());

        let mut breadcrumbs = Vec::with_capacity(chain.len());
        let mut path_so_far: Vec<String> = Vec::new();
        for ancestor_id in chain {
            let title = if ancestor_id == *id {
                container.title.clone()
            } else {
                self.repository.get_container(&ancestor_id).ok().and_then(|c| c.title)
            };
            let segment = if ancestor_id.is_root() {
                "root"
            } else {
                ancestor_id.as_str().rsplit('/').next().unwrap_or(ancestor_id.as_str())
            };
            path_so_far.push(segment.to_string());
            breadcrumbs.push(Breadcrumb {
                id: ancestor_id,
                title,
                path: format!("/{}", path_so_far.join("/")),
            });
        }
        Ok(breadcrumbs)
    }

    /// Resolve a slash-delimited path (e.g. `"docs/notes"`) to a container,
    /// walking from root. A missing segment returns `exists: false`, not an error.
    pub fn resolve_container_path(&self, path: &str) -> PodResult<ResolvedPath> {
        if path.is_empty() {
            return Err(PodError::invalid_id("resolve_container_path", "path must not be empty"));
        }

        let mut current = ResourceId::root();
        if path != "/" {
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                let children = self.repository.get_children(&current)?;
                let next = children.into_iter().find(|c| c.as_str() == segment);
                match next {
                    Some(child) => current = child,
                    None => {
                        return Ok(ResolvedPath {
                            container: None,
                            path: path.to_string(),
                            exists: false,
                            is_container: false,
                            breadcrumbs: vec![],
                        });
                    }
                }
            }
        }

        let container = self.repository.get_container(&current)?;
        let breadcrumbs = self.generate_breadcrumbs(&current)?;
        Ok(ResolvedPath {
            container: Some(ResolvedContainer {
                id: container.id,
                title: container.title,
            }),
            path: path.to_string(),
            exists: true,
            is_container: true,
            breadcrumbs,
        })
    }

    /// A bounded subtree rooted at `id`: the container, its members (as stubs)
    /// and its children recursively up to `depth` levels. Children beyond the
    /// limit are omitted entirely (`get_children` is not invoked at the leaf).
    /// Stops descending as soon as `cancellation` fires, returning whatever
    /// subtree has been gathered so far rather than erroring.
    pub fn generate_structure_info(
        &self,
        id: &ResourceId,
        depth: u32,
        cancellation: &CancellationToken,
    ) -> PodResult<StructureInfo> {
        self.walk(id, depth, 0, cancellation)
    }

    fn walk(
        &self,
        id: &ResourceId,
        max_depth: u32,
        current_depth: u32,
        cancellation: &CancellationToken,
    ) -> PodResult<StructureInfo> {
        let container = self.repository.get_container(id)?;
        let members = container.members.iter().cloned().map(|id| MemberInfo { id }).collect();

        let mut children = Vec::new();
        if current_depth < max_depth && !cancellation.is_cancelled() {
            for child_id in self.repository.get_children(id)? {
                if cancellation.is_cancelled() {
                    break;
                }
                children.push(self.walk(&child_id, max_depth, current_depth + 1, cancellation)?);
            }
        }

        Ok(StructureInfo {
            id: container.id,
            title: container.title,
            depth: current_depth,
            members,
            children,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ContainerTypeInfo {
    pub id: ResourceId,
    pub container_type: ContainerType,
    pub is_root: bool,
    pub member_count: usize,
    pub child_count: usize,
}

impl HierarchyEngine {
    /// Small descriptive record: kind and cardinality, without materializing
    /// full member/child lists.
    pub fn get_container_type_info(&self, id: &ResourceId) -> PodResult<ContainerTypeInfo> {
        let container = self.repository.get_container(id)?;
        let child_count = self.repository.get_children(id)?.len();
        Ok(ContainerTypeInfo {
            is_root: container.parent_id.is_none(),
            id: container.id,
            container_type: container.container_type,
            member_count: container.members.len(),
            child_count,
        })
    }
}
