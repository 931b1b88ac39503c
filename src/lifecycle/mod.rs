//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read config → Init logging/metrics → Assemble LocalAgent → start
//!
//! Shutdown (shutdown.rs):
//!     Signal or re-exec request → trigger → LocalAgent::stop → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then listener, then configuration source
//! - Ordered shutdown: source, background work, router, listener
//! - One root token; the agent's background token is its child

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupOptions};
