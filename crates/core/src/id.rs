//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::PodError;

/// Identifier of a resource or container.
///
/// Pod identifiers are opaque path segments (not UUIDs): a resource's id is
/// how it is addressed within its parent container, and the root container's
/// id is the fixed string `"/"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Construct an identifier, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, PodError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PodError::invalid_id("ResourceId::new", "id must not be empty"));
        }
        Ok(Self(id))
    }

    /// The fixed identifier of the pod's root container.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<ResourceId> for String {
    fn from(value: ResourceId) -> Self {
        value.0
    }
}

impl FromStr for ResourceId {
    type Err = PodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
