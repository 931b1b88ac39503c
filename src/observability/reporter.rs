//! Agent event reporting.
//!
//! Events are written to the log with the agent ID attached and counted in
//! `agent_events_total`.

use std::sync::Arc;

use crate::agent::AgentInfo;
use crate::observability::metrics;

/// Lifecycle events worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    StreamStarted { output: String },
    StreamUpdated { output: String, programs: usize },
    StreamStopped { output: String },
    UpgradeRequested { version: String },
}

impl AgentEvent {
    fn kind(&self) -> &'static str {
        match self {
            AgentEvent::StreamStarted { .. } => "stream_started",
            AgentEvent::StreamUpdated { .. } => "stream_updated",
            AgentEvent::StreamStopped { .. } => "stream_stopped",
            AgentEvent::UpgradeRequested { .. } => "upgrade_requested",
        }
    }
}

/// Reports agent events to the log.
#[derive(Debug, Clone)]
pub struct EventReporter {
    agent_info: Arc<AgentInfo>,
}

impl EventReporter {
    pub fn new(agent_info: Arc<AgentInfo>) -> Self {
        Self { agent_info }
    }

    pub fn report(&self, event: AgentEvent) {
        metrics::record_event(event.kind());
        let agent_id = self.agent_info.id();
        match &event {
            AgentEvent::UpgradeRequested { version } => {
                tracing::warn!(agent_id = %agent_id, version = %version, "Upgrade requested");
            }
            other => {
                tracing::info!(agent_id = %agent_id, event = ?other, "Agent event");
            }
        }
    }
}
