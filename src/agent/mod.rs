//! Agent assembly and lifecycle.

pub mod info;
pub mod local;

pub use info::AgentInfo;
pub use local::{AgentParts, LocalAgent, LocalAgentOptions};
