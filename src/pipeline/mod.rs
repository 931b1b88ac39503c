//! Processing pipeline.
//!
//! # Data Flow
//! ```text
//! Document (merged configuration)
//!     → emitter.rs (variables → filters → capabilities → programs → decorators)
//!     → router.rs (one stream per output, diffed against the last apply)
//!     → stream.rs (per-output program set, registered with the control listener)
//! ```
//!
//! # Design Decisions
//! - A configuration is applied whole or not at all
//! - The router serializes applies; last applied wins
//! - The route inventory is published atomically for lock-free readers

pub mod emitter;
pub mod modifiers;
pub mod router;
pub mod stream;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use thiserror::Error;

use crate::composable::ComposableError;
use crate::config::Document;

pub use emitter::Emitter;
pub use modifiers::{ConfigModifiers, DecoratorFn, FilterFn};
pub use router::StreamRouter;
pub use stream::{Stream, StreamFactory};

/// Output name used when an input does not set `use_output`.
pub const DEFAULT_OUTPUT: &str = "default";

/// A single input, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Unique input identifier.
    pub id: String,
    /// Input type (e.g. "logfile").
    pub input_type: String,
    /// Full input definition after rendering.
    pub spec: toml::Table,
}

/// Programs grouped by the output (route) they ship to.
pub type Programs = BTreeMap<String, Vec<Program>>;

/// Errors raised by the pipeline router.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("pipeline router is shut down")]
    Closed,
}

/// Errors raised while emitting a configuration.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("emit cancelled, agent is stopping")]
    Cancelled,

    #[error("rendering variables: {0}")]
    Composable(#[from] ComposableError),

    #[error("input #{index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("input {input:?} uses undefined output {output:?}")]
    UnknownOutput { input: String, output: String },

    #[error("duplicate input id {0:?}")]
    DuplicateId(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Receives applied configurations and drives downstream processing.
#[async_trait]
pub trait PipelineRouter: Send + Sync {
    /// Apply a full set of programs, replacing the previous one.
    async fn route(&self, programs: Programs) -> Result<(), RouterError>;

    /// Snapshot of the known route identifiers.
    fn routes(&self) -> BTreeSet<String>;

    /// Number of distinct configurations applied so far.
    fn applied_version(&self) -> u64;

    /// Stop every stream. Further applies fail with `RouterError::Closed`.
    async fn shutdown(&self) -> Result<(), RouterError>;
}

/// Hands a loaded configuration document to downstream processing.
#[async_trait]
pub trait Emit: Send + Sync {
    async fn emit(&self, doc: Document) -> Result<(), EmitError>;
}
