//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! discovered files (TOML)
//!     → loader.rs (read, parse, merge into one Document)
//!     → schema.rs (extract [agent] settings)
//!     → validation.rs (semantic checks)
//!     → emit pipeline (inputs/outputs, untouched here)
//! ```
//!
//! # Design Decisions
//! - A Document is immutable once loaded; a reload builds a new one
//! - All settings have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadError};
pub use schema::{
    AgentConfig, AgentSettings, ControlConfig, DownloadConfig, LogFormat, LoggingConfig,
    MonitoringConfig, ReloadConfig,
};
pub use validation::{validate_settings, ValidationError};

/// A raw configuration document.
pub type Document = toml::Table;
