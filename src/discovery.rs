//! Configuration file discovery.
//!
//! # Responsibilities
//! - Resolve an ordered list of glob patterns to configuration file paths
//! - Fail with a distinguished error when no usable pattern exists
//!
//! # Design Decisions
//! - Empty patterns are dropped when the discoverer is built; an empty set
//!   produces the `Empty` variant, which fails without touching the filesystem
//! - Every call re-globs (no caching) so reloads see new files
//! - Matches are concatenated in pattern order and never deduplicated

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors produced while discovering configuration files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no configuration found")]
    NoConfiguration,

    #[error("discovering configuration files: invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("discovering configuration files: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Resolves configuration file paths from a fixed pattern set.
#[derive(Debug, Clone)]
pub enum Discoverer {
    /// No usable pattern was supplied; discovery always fails.
    Empty,
    /// Non-empty patterns, in the order they were supplied.
    Patterns(Arc<[String]>),
}

impl Discoverer {
    /// Build a discoverer, dropping empty patterns.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();

        if patterns.is_empty() {
            Self::Empty
        } else {
            Self::Patterns(patterns.into())
        }
    }

    /// Patterns this discoverer resolves.
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::Empty => &[],
            Self::Patterns(patterns) => patterns,
        }
    }

    /// Resolve the patterns against the filesystem.
    pub fn discover(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        let patterns = match self {
            Self::Empty => return Err(DiscoveryError::NoConfiguration),
            Self::Patterns(patterns) => patterns,
        };

        let mut files = Vec::new();
        for pattern in patterns.iter() {
            let matches = glob::glob(pattern).map_err(|source| DiscoveryError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            for entry in matches {
                files.push(entry?);
            }
        }

        tracing::debug!(patterns = patterns.len(), files = files.len(), "Configuration files discovered");
        Ok(files)
    }
}
