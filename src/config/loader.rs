//! Configuration loading from disk.
//!
//! # Merge rules
//! - Files matching the external inputs pattern contribute their `[[inputs]]`
//!   entries, appended to the inputs collected so far.
//! - Every other file is deep-merged into the document in discovery order;
//!   on conflicting keys the later file wins.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::Document;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum LoadError {
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

    #[error("{}: `inputs` must be an array of tables", path.display())]
    InvalidInputs { path: PathBuf },

    #[error("invalid external inputs pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no configuration files to load")]
    Empty,
}

/// Loads and merges configuration documents.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    inputs_pattern: glob::Pattern,
}

impl ConfigLoader {
    /// Create a loader treating files matching `inputs_glob` as external inputs.
    pub fn new(inputs_glob: &str) -> Result<Self, LoadError> {
        let normalized = without_cur_dir(Path::new(inputs_glob));
        let inputs_pattern = glob::Pattern::new(&normalized.to_string_lossy()).map_err(|source| LoadError::Pattern {
            pattern: inputs_glob.to_string(),
            source,
        })?;
        Ok(Self { inputs_pattern })
    }

    /// Load every path and merge them into a single document.
    pub async fn load(&self, paths: &[PathBuf]) -> Result<Document, LoadError> {
        if paths.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut merged = Document::new();
        for path in paths {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            let doc = parse_document(path, &content)?;

            if self.is_external_input(path) {
                append_inputs(&mut merged, path, doc)?;
            } else {
                merge_into(&mut merged, doc);
            }
            tracing::trace!(path = %path.display(), "Configuration file loaded");
        }

        Ok(merged)
    }

    /// `./inputs.d/x.toml` and `inputs.d/x.toml` name the same file.
    fn is_external_input(&self, path: &Path) -> bool {
        self.inputs_pattern.matches_path(&without_cur_dir(path))
    }
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Load a single TOML file synchronously (used before the runtime is busy).
pub fn load_file(path: &Path) -> Result<Document, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(path, &content)
}

fn parse_document(path: &Path, content: &str) -> Result<Document, LoadError> {
    content.parse::<Document>().map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn append_inputs(merged: &mut Document, path: &Path, mut doc: Document) -> Result<(), LoadError> {
    let incoming = match doc.remove("inputs") {
        Some(toml::Value::Array(items)) => items,
        Some(_) => {
            return Err(LoadError::InvalidInputs {
                path: path.to_path_buf(),
            })
        }
        None => return Ok(()),
    };

    match merged
        .entry("inputs")
        .or_insert_with(|| toml::Value::Array(Vec::new()))
    {
        toml::Value::Array(existing) => existing.extend(incoming),
        other => *other = toml::Value::Array(incoming),
    }
    Ok(())
}

/// Deep-merge `src` into `dst`. Tables merge recursively; anything else is replaced.
pub fn merge_into(dst: &mut Document, src: Document) {
    for (key, value) in src {
        let toml::Value::Table(incoming) = value else {
            dst.insert(key, value);
            continue;
        };
        if let Some(toml::Value::Table(existing)) = dst.get_mut(&key) {
            merge_into(existing, incoming);
            continue;
        }
        dst.insert(key, toml::Value::Table(incoming));
    }
}
