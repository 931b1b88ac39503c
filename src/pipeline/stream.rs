//! Per-output streams.
//!
//! A stream owns the programs shipping to one output. Every change is
//! published to the control listener's registry and reported as an event.

use std::sync::Arc;

use crate::agent::AgentInfo;
use crate::control::{ApplicationRegistry, StreamStatus};
use crate::observability::{AgentEvent, EventReporter, Monitor};
use crate::pipeline::Program;

/// Programs shipping to a single output.
#[derive(Debug)]
pub struct Stream {
    output: String,
    programs: Vec<Program>,
    monitored: bool,
    registry: ApplicationRegistry,
    reporter: Arc<EventReporter>,
}

impl Stream {
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Replace the programs of this stream.
    pub fn update(&mut self, programs: Vec<Program>) {
        self.programs = programs;
        self.registry.upsert(StreamStatus {
            output: self.output.clone(),
            programs: self.programs.iter().map(|p| p.id.clone()).collect(),
            monitored: self.monitored,
        });
        self.reporter.report(AgentEvent::StreamUpdated {
            output: self.output.clone(),
            programs: self.programs.len(),
        });
    }

    /// Stop the stream and unregister it.
    pub fn close(self) {
        self.registry.remove(&self.output);
        self.reporter.report(AgentEvent::StreamStopped {
            output: self.output,
        });
    }
}

/// Creates streams bound to the agent's shared collaborators.
#[derive(Debug, Clone)]
pub struct StreamFactory {
    agent_info: Arc<AgentInfo>,
    registry: ApplicationRegistry,
    reporter: Arc<EventReporter>,
    monitor: Arc<Monitor>,
}

impl StreamFactory {
    pub fn new(
        agent_info: Arc<AgentInfo>,
        registry: ApplicationRegistry,
        reporter: Arc<EventReporter>,
        monitor: Arc<Monitor>,
    ) -> Self {
        Self {
            agent_info,
            registry,
            reporter,
            monitor,
        }
    }

    /// Create an empty stream for `output`.
    pub fn create(&self, output: &str) -> Stream {
        tracing::debug!(
            agent_id = %self.agent_info.id(),
            output = %output,
            "Creating stream"
        );
        self.reporter.report(AgentEvent::StreamStarted {
            output: output.to_string(),
        });
        Stream {
            output: output.to_string(),
            programs: Vec::new(),
            monitored: self.monitor.is_enabled() && self.monitor.use_output() == output,
            registry: self.registry.clone(),
            reporter: self.reporter.clone(),
        }
    }
}
