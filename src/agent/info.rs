//! Agent identity.

use serde::Serialize;
use uuid::Uuid;

/// Identity record of the running agent instance.
///
/// Created once at startup and shared read-only (`Arc<AgentInfo>`) with every
/// collaborator that needs to know who it is running for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    id: Uuid,
    version: &'static str,
}

impl AgentInfo {
    /// Create an identity with a fresh random ID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Create an identity with a known ID.
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> &'static str {
        self.version
    }
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self::new()
    }
}
