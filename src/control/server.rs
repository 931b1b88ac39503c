//! HTTP control server.
//!
//! # Responsibilities
//! - Bind the configured address on `start`
//! - Serve the control endpoints on a background task
//! - Shut down gracefully and join the task on `stop`

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::agent::AgentInfo;
use crate::config::ControlConfig;
use crate::control::handlers::{get_routes, get_status, ControlState};
use crate::control::{ApplicationRegistry, ControlListener, ListenerError};

struct Running {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

/// Control listener serving agent status over HTTP.
pub struct ControlServer {
    addr: SocketAddr,
    agent_info: Arc<AgentInfo>,
    registry: ApplicationRegistry,
    running: Option<Running>,
}

impl ControlServer {
    /// Validate the configuration. Nothing is bound until `start`.
    pub fn new(config: &ControlConfig, agent_info: Arc<AgentInfo>) -> Result<Self, ListenerError> {
        let addr = config
            .bind_address
            .parse()
            .map_err(|source| ListenerError::Address {
                address: config.bind_address.clone(),
                source,
            })?;

        Ok(Self {
            addr,
            agent_info,
            registry: ApplicationRegistry::new(),
            running: None,
        })
    }

    /// Registry the pipeline publishes its streams into.
    pub fn registry(&self) -> ApplicationRegistry {
        self.registry.clone()
    }

    /// Address actually bound, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    fn build_router(&self) -> Router {
        let state = ControlState {
            agent_info: self.agent_info.clone(),
            registry: self.registry.clone(),
        };
        Router::new()
            .route("/status", get(get_status))
            .route("/routes", get(get_routes))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl ControlListener for ControlServer {
    async fn start(&mut self) -> Result<(), ListenerError> {
        if self.running.is_some() {
            return Err(ListenerError::AlreadyStarted);
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let app = self.build_router();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        tracing::info!(address = %local_addr, "Control listener started");
        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ListenerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        running.task.await?.map_err(ListenerError::Serve)?;
        tracing::info!(address = %running.local_addr, "Control listener stopped");
        Ok(())
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }
}
