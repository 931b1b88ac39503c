//! Configuration schema definitions.
//!
//! Only the `[agent]` table is interpreted by the lifecycle controller. Every
//! other key (`inputs`, `outputs`, provider settings) travels through the emit
//! pipeline untouched, so the schema ignores unknown keys.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Document;

/// Root configuration for the agent process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent settings (`[agent]` table).
    pub agent: AgentSettings,
}

impl AgentConfig {
    /// Extract the agent settings from a raw configuration document.
    pub fn from_document(doc: &Document) -> Result<Self, toml::de::Error> {
        toml::Value::Table(doc.clone()).try_into()
    }
}

/// Settings that drive the agent lifecycle.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentSettings {
    /// Control listener settings.
    pub control: ControlConfig,

    /// Configuration reload policy.
    pub reload: ReloadConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Self-monitoring settings.
    pub monitoring: MonitoringConfig,

    /// Additional glob of configuration files merged after the main file.
    pub path: String,

    /// Artifact download settings used by the upgrader.
    pub download: DownloadConfig,
}

/// Control listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Bind address (e.g., "127.0.0.1:6789"). Port 0 picks an ephemeral port.
    pub bind_address: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:6789".to_string(),
        }
    }
}

/// Reload policy. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Reload configuration periodically instead of loading it once.
    pub enabled: bool,

    /// Reload period in milliseconds (ignored when disabled).
    pub period_ms: u64,
}

impl ReloadConfig {
    /// Reload period as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: 10_000,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Self-monitoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Inject a monitoring input into every applied configuration.
    pub enabled: bool,

    /// Output the monitoring input ships to.
    pub use_output: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_output: "default".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Artifact download configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Base URI artifacts are fetched from.
    pub source_uri: String,

    /// Directory downloaded artifacts land in.
    pub target_directory: String,

    /// Download timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            source_uri: "https://artifacts.local-agent.dev/downloads/".to_string(),
            target_directory: "downloads".to_string(),
            timeout_secs: 120,
        }
    }
}
