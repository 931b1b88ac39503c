//! Standalone agent driven by configuration files on disk.
//!
//! # Lifecycle
//! ```text
//! new():   capabilities → settings → logging → control listener → reporter
//!          → monitor → router → composable → discoverer → emitter
//!          → source (Once | Periodic) → upgrader
//! start(): listener.start → source.start
//! stop():  source.stop → cancel background token → router.shutdown → listener.stop
//! ```
//!
//! # Design Decisions
//! - Construction is all-or-nothing; the first failure is returned with its stage
//! - A source that fails to start rolls the listener back
//! - Every teardown step runs even when an earlier one fails; all failures
//!   are returned together

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentInfo;
use crate::capabilities::Capabilities;
use crate::composable::VarsController;
use crate::config::validation::validate_settings;
use crate::config::{AgentConfig, ConfigLoader, Document};
use crate::control::{ControlListener, ControlServer};
use crate::discovery::Discoverer;
use crate::error::{AgentError, Result};
use crate::observability::{logging, EventReporter, Monitor};
use crate::paths::Paths;
use crate::pipeline::{ConfigModifiers, Emitter, PipelineRouter, StreamFactory, StreamRouter};
use crate::source::{ConfigSource, Once, Periodic, ReloadCycle};
use crate::upgrade::{ReexecManager, Upgrader, UpgraderControl};

/// Inputs needed to assemble a `LocalAgent`.
pub struct LocalAgentOptions {
    /// Main configuration file.
    pub config_file: PathBuf,
    /// Resolved agent paths.
    pub paths: Paths,
    /// Parsed content of the main configuration file.
    pub raw_config: Document,
    pub agent_info: Arc<AgentInfo>,
    pub reexec: Arc<dyn ReexecManager>,
    pub upgrader_control: Arc<dyn UpgraderControl>,
}

/// Already-constructed components, for assembling an agent by hand.
pub struct AgentParts {
    pub ctx: CancellationToken,
    pub agent_info: Arc<AgentInfo>,
    pub listener: Box<dyn ControlListener>,
    pub router: Arc<dyn PipelineRouter>,
    pub source: Box<dyn ConfigSource>,
}

/// An agent reading its configuration directly from disk.
pub struct LocalAgent {
    ctx: CancellationToken,
    agent_info: Arc<AgentInfo>,
    listener: Mutex<Box<dyn ControlListener>>,
    router: Arc<dyn PipelineRouter>,
    source: Mutex<Box<dyn ConfigSource>>,
}

impl LocalAgent {
    /// Assemble the agent. `parent` bounds all background work.
    pub fn new(parent: &CancellationToken, options: LocalAgentOptions) -> Result<Self> {
        let LocalAgentOptions {
            config_file,
            paths,
            raw_config,
            agent_info,
            reexec,
            upgrader_control,
        } = options;

        let caps = Capabilities::load(&paths.capabilities_path())
            .map_err(|e| AgentError::construction("load capabilities", e))?;
        let caps = Arc::new(caps);

        let cfg = AgentConfig::from_document(&raw_config)
            .map_err(|e| AgentError::construction("parse agent settings", e))?;
        validate_settings(&cfg.agent).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            AgentError::construction("validate agent settings", message)
        })?;
        let settings = cfg.agent;

        logging::init(&settings.logging);

        let ctx = parent.child_token();

        let server = ControlServer::new(&settings.control, agent_info.clone())
            .map_err(|e| AgentError::construction("initialize control listener", e))?;

        let reporter = Arc::new(EventReporter::new(agent_info.clone()));

        let monitor = Monitor::new(&settings.monitoring)
            .map_err(|e| AgentError::construction("initialize monitoring", e))?;
        let monitor = Arc::new(monitor);

        let router: Arc<dyn PipelineRouter> = Arc::new(StreamRouter::new(StreamFactory::new(
            agent_info.clone(),
            server.registry(),
            reporter.clone(),
            monitor.clone(),
        )));

        let composable = VarsController::new(&raw_config)
            .map_err(|e| AgentError::construction("initialize composable controller", e))?;

        let discoverer = Discoverer::new([
            config_file.to_string_lossy().into_owned(),
            settings.path.clone(),
            paths.external_inputs_glob(),
        ]);

        let emitter = Emitter::new(
            ctx.clone(),
            agent_info.clone(),
            composable,
            router.clone(),
            ConfigModifiers::standard(),
            caps.clone(),
            monitor,
        );

        let loader = ConfigLoader::new(&paths.external_inputs_glob())
            .map_err(|e| AgentError::construction("initialize configuration loader", e))?;

        let cycle = ReloadCycle::new(discoverer, loader, Arc::new(emitter));
        let source: Box<dyn ConfigSource> = if settings.reload.enabled {
            tracing::debug!(period = ?settings.reload.period(), "Reloading of configuration is on");
            Box::new(Periodic::new(cycle, settings.reload.period(), ctx.clone()))
        } else {
            tracing::debug!("Reloading of configuration is off");
            Box::new(Once::new(cycle))
        };

        upgrader_control.set_upgrader(Upgrader::new(
            agent_info.clone(),
            settings.download.clone(),
            vec![ctx.clone()],
            reexec,
            reporter,
            caps,
        ));

        Ok(Self::from_parts(AgentParts {
            ctx,
            agent_info,
            listener: Box::new(server),
            router,
            source,
        }))
    }

    /// Assemble an agent from already-built components.
    pub fn from_parts(parts: AgentParts) -> Self {
        Self {
            ctx: parts.ctx,
            agent_info: parts.agent_info,
            listener: Mutex::new(parts.listener),
            router: parts.router,
            source: Mutex::new(parts.source),
        }
    }

    /// Start the control listener, then the configuration source.
    pub async fn start(&self) -> Result<()> {
        tracing::info!(agent_id = %self.agent_info.id(), "Agent is starting");

        self.listener.lock().await.start().await?;

        if let Err(e) = self.source.lock().await.start().await {
            tracing::error!(error = %e, "Configuration source failed to start");
            if let Err(stop_err) = self.listener.lock().await.stop().await {
                tracing::warn!(error = %stop_err, "Failed to roll back control listener");
            }
            return Err(e.into());
        }

        tracing::info!("Agent is running");
        Ok(())
    }

    /// Tear everything down. All steps run regardless of earlier failures.
    pub async fn stop(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.source.lock().await.stop().await {
            tracing::error!(error = %e, "Failed to stop configuration source");
            errors.push(AgentError::Source(e));
        }

        self.ctx.cancel();

        if let Err(e) = self.router.shutdown().await {
            tracing::error!(error = %e, "Failed to shut down pipeline router");
            errors.push(AgentError::Router(e));
        }

        if let Err(e) = self.listener.lock().await.stop().await {
            tracing::error!(error = %e, "Failed to stop control listener");
            errors.push(AgentError::Listener(e));
        }

        tracing::info!("Agent is stopped");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AgentError::Shutdown(errors))
        }
    }

    /// Routes currently handled by the agent.
    pub fn routes(&self) -> BTreeSet<String> {
        self.router.routes()
    }

    /// Number of configurations the router has applied.
    pub fn applied_version(&self) -> u64 {
        self.router.applied_version()
    }

    pub fn agent_info(&self) -> &Arc<AgentInfo> {
        &self.agent_info
    }

    /// Background token; cancelled by `stop`.
    pub fn background_token(&self) -> &CancellationToken {
        &self.ctx
    }
}
