//! Upgrade coordination.
//!
//! The upgrader decides whether an upgrade may proceed, stops background work
//! and hands over to the re-exec manager. Fetching and replacing the binary
//! is left to the re-exec manager.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentInfo;
use crate::capabilities::Capabilities;
use crate::config::DownloadConfig;
use crate::observability::{AgentEvent, EventReporter};

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("version {0} is already running")]
    AlreadyRunning(String),

    #[error("upgrade to {0} denied by capabilities")]
    Denied(String),

    #[error("re-exec failed: {0}")]
    Reexec(String),
}

/// Restarts the agent process into a new binary.
pub trait ReexecManager: Send + Sync {
    fn reexec(&self, artifact_uri: &str) -> Result<(), UpgradeError>;
}

/// Receives the upgrader once the agent is assembled.
pub trait UpgraderControl: Send + Sync {
    fn set_upgrader(&self, upgrader: Upgrader);
}

/// Coordinates an upgrade of the running agent.
pub struct Upgrader {
    agent_info: Arc<AgentInfo>,
    download: DownloadConfig,
    cancellers: Vec<CancellationToken>,
    reexec: Arc<dyn ReexecManager>,
    reporter: Arc<EventReporter>,
    caps: Arc<Capabilities>,
}

impl Upgrader {
    pub fn new(
        agent_info: Arc<AgentInfo>,
        download: DownloadConfig,
        cancellers: Vec<CancellationToken>,
        reexec: Arc<dyn ReexecManager>,
        reporter: Arc<EventReporter>,
        caps: Arc<Capabilities>,
    ) -> Self {
        Self {
            agent_info,
            download,
            cancellers,
            reexec,
            reporter,
            caps,
        }
    }

    /// Location the artifact for `version` is fetched from.
    pub fn artifact_uri(&self, version: &str) -> String {
        format!(
            "{}/local-agent-{version}.tar.gz",
            self.download.source_uri.trim_end_matches('/')
        )
    }

    /// Upgrade to `version`: cancel background work, then re-exec.
    pub fn upgrade(&self, version: &str) -> Result<(), UpgradeError> {
        if version == self.agent_info.version() {
            return Err(UpgradeError::AlreadyRunning(version.to_string()));
        }
        if !self.caps.allows_upgrade(version) {
            return Err(UpgradeError::Denied(version.to_string()));
        }

        self.reporter.report(AgentEvent::UpgradeRequested {
            version: version.to_string(),
        });
        for token in &self.cancellers {
            token.cancel();
        }

        let uri = self.artifact_uri(version);
        tracing::info!(
            version = %version,
            artifact = %uri,
            target_directory = %self.download.target_directory,
            "Handing over to re-exec manager"
        );
        self.reexec.reexec(&uri)
    }
}

/// An `UpgraderControl` that simply keeps the upgrader for later use.
#[derive(Default)]
pub struct UpgraderSlot {
    upgrader: Mutex<Option<Arc<Upgrader>>>,
}

impl UpgraderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrader(&self) -> Option<Arc<Upgrader>> {
        let slot = self
            .upgrader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone()
    }
}

impl UpgraderControl for UpgraderSlot {
    fn set_upgrader(&self, upgrader: Upgrader) {
        let mut slot = self
            .upgrader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::new(upgrader));
    }
}
