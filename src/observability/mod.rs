//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//!     → reporter.rs (agent lifecycle events)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments) and always recorded;
//!   exposition is opt-in
//! - Monitor settings are read-only after construction

pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod reporter;

pub use monitor::{Monitor, MonitorError};
pub use reporter::{AgentEvent, EventReporter};
