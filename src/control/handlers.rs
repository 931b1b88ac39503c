use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::agent::AgentInfo;
use crate::control::{ApplicationRegistry, StreamStatus};

/// State shared by the control handlers.
#[derive(Clone)]
pub struct ControlState {
    pub agent_info: Arc<AgentInfo>,
    pub registry: ApplicationRegistry,
}

#[derive(Serialize)]
pub struct AgentStatus {
    pub id: String,
    pub version: &'static str,
    pub status: &'static str,
    pub streams: Vec<StreamStatus>,
}

pub async fn get_status(State(state): State<ControlState>) -> Json<AgentStatus> {
    Json(AgentStatus {
        id: state.agent_info.id().to_string(),
        version: state.agent_info.version(),
        status: "running",
        streams: state.registry.snapshot(),
    })
}

pub async fn get_routes(State(state): State<ControlState>) -> Json<Vec<String>> {
    Json(state.registry.routes())
}
