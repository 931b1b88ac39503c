//! Standalone agent lifecycle controller.
//!
//! # Architecture Overview
//!
//! ```text
//!     config files on disk
//!            │
//!            ▼
//!     ┌────────────┐   ┌──────────┐   ┌───────────┐   ┌─────────────┐
//!     │ discovery  │──▶│  config  │──▶│  source   │──▶│  pipeline   │
//!     │ (globs)    │   │ (loader) │   │ Once or   │   │ emit/router │
//!     └────────────┘   └──────────┘   │ Periodic  │   └──────┬──────┘
//!                                     └───────────┘          │
//!                                                            ▼
//!     ┌──────────────────────────────────────────┐   ┌─────────────┐
//!     │ agent::LocalAgent (start / stop / routes)│   │  control    │
//!     │   owns listener, router, source          │   │ /status     │
//!     └──────────────────────────────────────────┘   │ /routes     │
//!                                                    └─────────────┘
//! ```

// Core subsystems
pub mod agent;
pub mod config;
pub mod discovery;
pub mod pipeline;
pub mod source;

// Agent surfaces
pub mod capabilities;
pub mod composable;
pub mod control;
pub mod paths;
pub mod upgrade;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use agent::{AgentInfo, LocalAgent, LocalAgentOptions};
pub use config::Document;
pub use discovery::Discoverer;
pub use error::AgentError;
pub use lifecycle::Shutdown;
pub use source::{ConfigSource, Once, Periodic};
