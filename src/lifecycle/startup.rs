//! Startup orchestration.
//!
//! # Responsibilities
//! - Read the main configuration file
//! - Initialize logging and the metrics endpoint
//! - Assemble and start the agent, then wait for shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A re-exec request shuts the process down; the supervisor restarts it

use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::{AgentInfo, LocalAgent, LocalAgentOptions};
use crate::config::{loader, AgentConfig};
use crate::error::{AgentError, Result};
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics, Monitor};
use crate::paths::Paths;
use crate::upgrade::{ReexecManager, UpgradeError, UpgraderSlot};

/// Where the agent reads its configuration from.
#[derive(Debug, Clone)]
pub struct StartupOptions {
    pub config_file: PathBuf,
    /// Overrides the directory derived from `config_file`.
    pub config_dir: Option<PathBuf>,
}

/// Re-exec by shutting down; the process supervisor starts the new binary.
struct ShutdownReexec {
    shutdown: Shutdown,
}

impl ReexecManager for ShutdownReexec {
    fn reexec(&self, artifact_uri: &str) -> std::result::Result<(), UpgradeError> {
        tracing::warn!(artifact = %artifact_uri, "Restart requested for upgrade");
        self.shutdown.trigger();
        Ok(())
    }
}

/// Run the agent until `shutdown` is triggered.
pub async fn run(options: StartupOptions, shutdown: Shutdown) -> Result<()> {
    let raw_config = loader::load_file(&options.config_file)
        .map_err(|e| AgentError::construction("read configuration", e))?;
    let cfg = AgentConfig::from_document(&raw_config)
        .map_err(|e| AgentError::construction("parse agent settings", e))?;

    logging::init(&cfg.agent.logging);
    tracing::info!(
        config = %options.config_file.display(),
        reload = cfg.agent.reload.enabled,
        "Configuration loaded"
    );

    let monitor = Monitor::new(&cfg.agent.monitoring)
        .map_err(|e| AgentError::construction("initialize monitoring", e))?;
    if let Some(addr) = monitor.metrics_address() {
        metrics::init_metrics(addr)
            .map_err(|e| AgentError::construction("initialize metrics endpoint", e))?;
    }

    let paths = match options.config_dir {
        Some(dir) => Paths::with_config_dir(dir),
        None => Paths::from_config_file(&options.config_file),
    };

    let agent = LocalAgent::new(
        shutdown.token(),
        LocalAgentOptions {
            config_file: options.config_file,
            paths,
            raw_config,
            agent_info: Arc::new(AgentInfo::new()),
            reexec: Arc::new(ShutdownReexec {
                shutdown: shutdown.clone(),
            }),
            upgrader_control: Arc::new(UpgraderSlot::new()),
        },
    )?;

    agent.start().await?;
    tracing::info!(routes = ?agent.routes(), "Agent started");

    shutdown.wait().await;
    agent.stop().await
}
