//! Well-known locations relative to the configuration directory.

use std::path::{Path, PathBuf};

/// Glob, relative to the config directory, of external input files.
pub const EXTERNAL_INPUTS_PATTERN: &str = "inputs.d/*.toml";

/// File name of the capabilities definition.
pub const CAPABILITIES_FILE: &str = "capabilities.toml";

/// Resolved agent paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    config_dir: PathBuf,
}

impl Paths {
    /// Use the directory containing `config_file` as the config directory.
    pub fn from_config_file(config_file: &Path) -> Self {
        let config_dir = match config_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { config_dir }
    }

    /// Use an explicit config directory.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn capabilities_path(&self) -> PathBuf {
        self.config_dir.join(CAPABILITIES_FILE)
    }

    /// Glob matching external input files.
    pub fn external_inputs_glob(&self) -> String {
        self.config_dir
            .join(EXTERNAL_INPUTS_PATTERN)
            .to_string_lossy()
            .into_owned()
    }
}
