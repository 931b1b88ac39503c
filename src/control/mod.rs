//! Control listener.
//!
//! # Data Flow
//! ```text
//! pipeline streams → registry.rs (ApplicationRegistry, lock-free snapshot)
//! HTTP client      → server.rs (axum) → handlers.rs → registry snapshot
//! ```
//!
//! # Endpoints
//! - `GET /status`: agent identity and registered streams
//! - `GET /routes`: route identifiers currently registered

pub mod handlers;
pub mod registry;
pub mod server;

use async_trait::async_trait;
use thiserror::Error;

pub use registry::{ApplicationRegistry, StreamStatus};
pub use server::ControlServer;

/// Error type for control listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid control address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind control listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("control listener already started")]
    AlreadyStarted,

    #[error("control listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("control listener task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A long-lived endpoint exposing agent status and control operations.
#[async_trait]
pub trait ControlListener: Send {
    async fn start(&mut self) -> Result<(), ListenerError>;

    /// Stop serving. Stopping a listener that never started succeeds.
    async fn stop(&mut self) -> Result<(), ListenerError>;
}
