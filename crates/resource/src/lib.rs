//! Resources: stored byte payloads with hybrid-consistency writes (the
//! service writes the repository directly and commits events).

pub mod event_handler;
pub mod repository;
pub mod resource;
pub mod storage_service;
pub mod streaming;

pub use event_handler::ResourceEventHandler;
pub use repository::{InMemoryResourceRepository, ResourceRepository, StoredResource};
pub use resource::Resource;
pub use storage_service::StorageService;
pub use streaming::ByteStream;
