//! Emit pipeline.
//!
//! # Responsibilities
//! - Render variables, run filters, apply capabilities
//! - Build programs grouped by output and decorate them
//! - Hand the result to the router in one piece
//!
//! # Design Decisions
//! - Emit refuses to start once the background token is cancelled
//! - Inputs must reference an output defined under `[outputs]`

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentInfo;
use crate::capabilities::Capabilities;
use crate::composable::VarsController;
use crate::config::Document;
use crate::observability::Monitor;
use crate::pipeline::{
    ConfigModifiers, Emit, EmitError, PipelineRouter, Program, Programs, DEFAULT_OUTPUT,
};

/// Applies loaded configuration documents to the pipeline router.
pub struct Emitter {
    ctx: CancellationToken,
    agent_info: Arc<AgentInfo>,
    composable: VarsController,
    router: Arc<dyn PipelineRouter>,
    modifiers: ConfigModifiers,
    caps: Arc<Capabilities>,
    monitor: Arc<Monitor>,
}

impl Emitter {
    pub fn new(
        ctx: CancellationToken,
        agent_info: Arc<AgentInfo>,
        composable: VarsController,
        router: Arc<dyn PipelineRouter>,
        modifiers: ConfigModifiers,
        caps: Arc<Capabilities>,
        monitor: Arc<Monitor>,
    ) -> Self {
        Self {
            ctx,
            agent_info,
            composable,
            router,
            modifiers,
            caps,
            monitor,
        }
    }

    fn build_programs(&self, doc: Document) -> Result<Programs, EmitError> {
        let mut doc = self.composable.render(doc)?;
        for filter in &self.modifiers.filters {
            filter(&mut doc)?;
        }
        self.caps.filter_inputs(&mut doc);

        let mut programs = programs_from(&doc)?;
        for decorator in &self.modifiers.decorators {
            decorator(&self.agent_info, &self.monitor, &mut programs)?;
        }
        Ok(programs)
    }
}

#[async_trait]
impl Emit for Emitter {
    async fn emit(&self, doc: Document) -> Result<(), EmitError> {
        if self.ctx.is_cancelled() {
            return Err(EmitError::Cancelled);
        }

        let programs = self.build_programs(doc)?;
        tracing::debug!(
            outputs = programs.len(),
            programs = programs.values().map(Vec::len).sum::<usize>(),
            "Emitting configuration"
        );

        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => Err(EmitError::Cancelled),
            result = self.router.route(programs) => result.map_err(EmitError::from),
        }
    }
}

/// Group the document's inputs by the output they ship to.
fn programs_from(doc: &Document) -> Result<Programs, EmitError> {
    let outputs = doc.get("outputs").and_then(|o| o.as_table());
    let inputs = match doc.get("inputs").and_then(|i| i.as_array()) {
        Some(inputs) => inputs.as_slice(),
        None => &[],
    };

    let mut programs = Programs::new();
    let mut seen = HashSet::new();
    for (index, input) in inputs.iter().enumerate() {
        let Some(spec) = input.as_table() else {
            return Err(EmitError::InvalidInput {
                index,
                reason: "input must be a table".into(),
            });
        };
        let input_type = spec
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| EmitError::InvalidInput {
                index,
                reason: "missing input type".into(),
            })?;
        let id = match spec.get("id").and_then(|i| i.as_str()) {
            Some(id) => id.to_string(),
            None => format!("{input_type}-{index}"),
        };
        if !seen.insert(id.clone()) {
            return Err(EmitError::DuplicateId(id));
        }

        let output = spec
            .get("use_output")
            .and_then(|o| o.as_str())
            .unwrap_or(DEFAULT_OUTPUT);
        if !outputs.is_some_and(|o| o.contains_key(output)) {
            return Err(EmitError::UnknownOutput {
                input: id,
                output: output.to_string(),
            });
        }

        programs.entry(output.to_string()).or_default().push(Program {
            id,
            input_type: input_type.to_string(),
            spec: spec.clone(),
        });
    }
    Ok(programs)
}
