//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of agent settings (serde handles syntactic)
//! - Validate value ranges (reload period > 0) and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: AgentSettings → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AgentSettings;

/// A single semantic problem found in the agent settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("agent.reload.period_ms must be greater than zero when reload is enabled")]
    ZeroReloadPeriod,

    #[error("agent.control.bind_address {0:?} is not a socket address")]
    ControlAddress(String),

    #[error("agent.monitoring.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("agent.download.source_uri must not be empty")]
    EmptyDownloadUri,
}

/// Check the agent settings, collecting every problem found.
pub fn validate_settings(settings: &AgentSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.reload.enabled && settings.reload.period_ms == 0 {
        errors.push(ValidationError::ZeroReloadPeriod);
    }

    if settings.control.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::ControlAddress(
            settings.control.bind_address.clone(),
        ));
    }

    if settings.monitoring.metrics_enabled
        && settings.monitoring.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            settings.monitoring.metrics_address.clone(),
        ));
    }

    if settings.download.source_uri.trim().is_empty() {
        errors.push(ValidationError::EmptyDownloadUri);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&AgentSettings::default()).is_ok());
    }

    #[test]
    fn test_zero_period_only_matters_when_enabled() {
        let mut settings = AgentSettings::default();
        settings.reload.period_ms = 0;
        settings.reload.enabled = false;
        assert!(validate_settings(&settings).is_ok());

        settings.reload.enabled = true;
        assert_eq!(
            validate_settings(&settings).unwrap_err(),
            vec![ValidationError::ZeroReloadPeriod]
        );
    }

    #[test]
    fn test_reports_every_error() {
        let mut settings = AgentSettings::default();
        settings.control.bind_address = "localhost".into();
        settings.download.source_uri = "  ".into();

        let errors = validate_settings(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::EmptyDownloadUri));
    }
}
