//! Self-monitoring settings shared with the pipeline.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::MonitoringConfig;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid metrics address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("monitoring output name must not be empty")]
    EmptyOutput,
}

/// Read-only view of the monitoring settings.
#[derive(Debug, Clone)]
pub struct Monitor {
    enabled: bool,
    use_output: String,
    metrics_address: Option<SocketAddr>,
}

impl Monitor {
    pub fn new(config: &MonitoringConfig) -> Result<Self, MonitorError> {
        if config.enabled && config.use_output.is_empty() {
            return Err(MonitorError::EmptyOutput);
        }

        let metrics_address = if config.metrics_enabled {
            let addr = config
                .metrics_address
                .parse()
                .map_err(|source| MonitorError::Address {
                    address: config.metrics_address.clone(),
                    source,
                })?;
            Some(addr)
        } else {
            None
        };

        Ok(Self {
            enabled: config.enabled,
            use_output: config.use_output.clone(),
            metrics_address,
        })
    }

    /// Whether a monitoring input is injected into applied configurations.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn use_output(&self) -> &str {
        &self.use_output
    }

    /// Prometheus endpoint address, when exposition is enabled.
    pub fn metrics_address(&self) -> Option<SocketAddr> {
        self.metrics_address
    }
}
