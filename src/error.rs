//! Crate-level error type for the agent lifecycle.

use thiserror::Error;

use crate::control::ListenerError;
use crate::pipeline::RouterError;
use crate::source::SourceError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by `LocalAgent`.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A dependency failed to initialize; the agent was not assembled.
    #[error("{stage}: {source}")]
    Construction {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("control listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("configuration source: {0}")]
    Source(#[from] SourceError),

    #[error("pipeline router: {0}")]
    Router(#[from] RouterError),

    /// One or more teardown steps failed. Every step was still attempted.
    #[error("shutdown failed: {}", join(.0))]
    Shutdown(Vec<AgentError>),
}

impl AgentError {
    /// Wrap a construction failure with the stage it happened in.
    pub fn construction(stage: &'static str, source: impl Into<BoxError>) -> Self {
        AgentError::Construction {
            stage,
            source: source.into(),
        }
    }
}

fn join(errors: &[AgentError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AgentError>;
