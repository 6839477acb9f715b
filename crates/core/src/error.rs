//! Domain error model.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Result type used across the domain layer.
pub type PodResult<T> = Result<T, PodError>;

/// Stable error-kind codes surfaced to callers.
///
/// Kinds are split into client-recoverable (4xx-like) and systemic (5xx-like);
/// see [`ErrorKind::is_client_error`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("INVALID_ID")]
    InvalidId,
    #[error("INVALID_RESOURCE")]
    InvalidResource,
    #[error("UNSUPPORTED_FORMAT")]
    UnsupportedFormat,
    #[error("FORMAT_CONVERSION_FAILED")]
    FormatConversionFailed,
    #[error("RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    #[error("RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists,
    #[error("CONTAINER_NOT_EMPTY")]
    ContainerNotEmpty,
    #[error("INVALID_HIERARCHY")]
    InvalidHierarchy,
    #[error("STORAGE_OPERATION_FAILED")]
    StorageOperationFailed,
    #[error("EVENT_COMMIT_FAILED")]
    EventCommitFailed,
    #[error("STREAM_READ_FAILED")]
    StreamReadFailed,
    #[error("BACKPRESSURE")]
    Backpressure,
}

impl ErrorKind {
    /// Whether this kind is caller-recoverable (4xx-like) rather than systemic (5xx-like).
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidId
                | ErrorKind::InvalidResource
                | ErrorKind::UnsupportedFormat
                | ErrorKind::ResourceNotFound
                | ErrorKind::ResourceAlreadyExists
                | ErrorKind::ContainerNotEmpty
                | ErrorKind::InvalidHierarchy
        )
    }
}

/// Domain-level error carried through every public operation.
///
/// Carries the stable [`ErrorKind`] code, a human message, the operation that
/// raised it, free-form context (e.g. `containerID`, `path`), and an optional
/// cause chain for diagnostics.
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message} (operation={operation})")]
pub struct PodError {
    pub kind: ErrorKind,
    pub message: String,
    pub operation: String,
    pub context: BTreeMap<String, String>,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl PodError {
    pub fn new(kind: ErrorKind, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: operation.into(),
            context: BTreeMap::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn invalid_id(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidId, operation, message)
    }

    pub fn invalid_resource(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResource, operation, message)
    }

    pub fn not_found(operation: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::ResourceNotFound, operation, format!("not found: {id}"))
            .with_context("id", id)
    }

    pub fn container_not_empty(operation: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::ContainerNotEmpty,
            operation,
            format!("container is not empty: {id}"),
        )
        .with_context("id", id)
    }

    pub fn invalid_hierarchy(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidHierarchy, operation, message)
    }

    pub fn storage_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageOperationFailed, operation, message)
    }

    pub fn event_commit_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EventCommitFailed, operation, message)
    }

    pub fn backpressure(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backpressure, operation, message)
    }

    pub fn is_client_error(&self) -> bool {
        self.kind.is_client_error()
    }
}
