//! Configuration sources.
//!
//! # Data Flow
//! ```text
//! Once (once.rs):
//!     start → discover → load → emit (exactly one time)
//!
//! Periodic (periodic.rs):
//!     start → initial cycle → background task
//!         every period: discover → load → emit
//!     stop → cancel schedule → join task
//! ```
//!
//! # Design Decisions
//! - A cycle always runs discover, then load, then emit; any failure ends the cycle
//! - Globbing walks the filesystem on the blocking pool
//! - Once escalates failures; Periodic logs them and keeps its schedule
//! - Cycles never overlap: they run inline in the reload loop

pub mod once;
pub mod periodic;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ConfigLoader, LoadError};
use crate::discovery::{Discoverer, DiscoveryError};
use crate::pipeline::{Emit, EmitError};

pub use once::Once;
pub use periodic::Periodic;

/// Errors produced by a configuration source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("loading configuration: {0}")]
    Load(#[from] LoadError),

    #[error("applying configuration: {0}")]
    Emit(#[from] EmitError),

    #[error("configuration source already started")]
    AlreadyStarted,

    #[error("reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SourceError {
    /// Whether discovery found no usable pattern.
    pub fn is_no_configuration(&self) -> bool {
        matches!(self, SourceError::Discovery(DiscoveryError::NoConfiguration))
    }
}

/// Lifecycle state of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// A strategy for obtaining the running configuration.
#[async_trait]
pub trait ConfigSource: Send {
    async fn start(&mut self) -> Result<(), SourceError>;

    async fn stop(&mut self) -> Result<(), SourceError>;

    fn state(&self) -> SourceState;
}

/// One discover → load → emit pass.
#[derive(Clone)]
pub struct ReloadCycle {
    discoverer: Discoverer,
    loader: ConfigLoader,
    emit: Arc<dyn Emit>,
}

impl ReloadCycle {
    pub fn new(discoverer: Discoverer, loader: ConfigLoader, emit: Arc<dyn Emit>) -> Self {
        Self {
            discoverer,
            loader,
            emit,
        }
    }

    /// Run the cycle. Returns the number of files applied.
    pub async fn run(&self) -> Result<usize, SourceError> {
        let discoverer = self.discoverer.clone();
        let files = tokio::task::spawn_blocking(move || discoverer.discover()).await??;
        let doc = self.loader.load(&files).await?;
        self.emit.emit(doc).await?;
        Ok(files.len())
    }
}
