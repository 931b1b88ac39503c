//! Capability rules restricting what a configuration may enable.
//!
//! # Format
//! ```toml
//! [[capabilities]]
//! rule = "deny"
//! input = "system/*"
//!
//! [[capabilities]]
//! rule = "deny"
//! upgrade = "*"
//! ```
//!
//! # Design Decisions
//! - Rules are evaluated in file order; the first matching rule decides
//! - Anything no rule matches is allowed
//! - A missing capabilities file allows everything

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::Document;

/// Error type for loading capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid capability pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RuleKind {
    Allow,
    Deny,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    rule: RuleKind,
    input: Option<String>,
    upgrade: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CapabilitiesFile {
    #[serde(default)]
    capabilities: Vec<RuleSpec>,
}

#[derive(Debug, Clone)]
enum Target {
    Input(glob::Pattern),
    Upgrade(glob::Pattern),
}

#[derive(Debug, Clone)]
struct Rule {
    kind: RuleKind,
    target: Target,
}

/// Compiled capability rules.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    rules: Vec<Rule>,
}

impl Capabilities {
    /// Capabilities that allow everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Load capabilities from `path`. A missing file allows everything.
    pub fn load(path: &Path) -> Result<Self, CapabilityError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No capabilities file, allowing everything");
                return Ok(Self::allow_all());
            }
            Err(source) => {
                return Err(CapabilityError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml(&content).map_err(|e| match e {
            CapabilityError::Parse { source, .. } => CapabilityError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Compile capabilities from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, CapabilityError> {
        let file: CapabilitiesFile =
            toml::from_str(content).map_err(|source| CapabilityError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        let mut rules = Vec::new();
        for spec in file.capabilities {
            if let Some(input) = &spec.input {
                rules.push(Rule {
                    kind: spec.rule,
                    target: Target::Input(compile(input)?),
                });
            }
            if let Some(upgrade) = &spec.upgrade {
                rules.push(Rule {
                    kind: spec.rule,
                    target: Target::Upgrade(compile(upgrade)?),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Whether inputs of `input_type` may run.
    pub fn allows_input(&self, input_type: &str) -> bool {
        self.first_match(|target| match target {
            Target::Input(p) => p.matches(input_type),
            Target::Upgrade(_) => false,
        })
    }

    /// Whether upgrading to `version` is permitted.
    pub fn allows_upgrade(&self, version: &str) -> bool {
        self.first_match(|target| match target {
            Target::Upgrade(p) => p.matches(version),
            Target::Input(_) => false,
        })
    }

    /// Remove denied inputs from the document. Returns how many were removed.
    pub fn filter_inputs(&self, doc: &mut Document) -> usize {
        let Some(toml::Value::Array(inputs)) = doc.get_mut("inputs") else {
            return 0;
        };

        let before = inputs.len();
        inputs.retain(|input| {
            let input_type = input.get("type").and_then(|t| t.as_str()).unwrap_or_default();
            let allowed = self.allows_input(input_type);
            if !allowed {
                tracing::info!(input_type = %input_type, "Input removed by capabilities");
            }
            allowed
        });
        before - inputs.len()
    }

    fn first_match(&self, matches: impl Fn(&Target) -> bool) -> bool {
        self.rules
            .iter()
            .find(|rule| matches(&rule.target))
            .map(|rule| rule.kind == RuleKind::Allow)
            .unwrap_or(true)
    }
}

fn compile(pattern: &str) -> Result<glob::Pattern, CapabilityError> {
    glob::Pattern::new(pattern).map_err(|source| CapabilityError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
