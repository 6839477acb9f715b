//! Containers: LDP BasicContainer nodes in the pod tree, purely event-sourced
//! (the service never writes the materialized repository directly).

pub mod container;
pub mod container_service;
pub mod event_handler;
pub mod hierarchy_engine;
pub mod repository;

pub use container::{Container, ContainerType};
pub use container_service::{ContainerService, MemberPage};
pub use event_handler::ContainerEventHandler;
pub use hierarchy_engine::{Breadcrumb, ContainerTypeInfo, HierarchyEngine, MemberInfo, ResolvedContainer, ResolvedPath, StructureInfo};
pub use repository::{ContainerRepository, InMemoryContainerRepository, StoredContainer};
