//! Decorators and filters applied by the emitter.

use crate::agent::AgentInfo;
use crate::config::Document;
use crate::observability::Monitor;
use crate::pipeline::{EmitError, Program, Programs};

/// Inspects or rewrites the rendered document before programs are built.
pub type FilterFn = fn(&mut Document) -> Result<(), EmitError>;

/// Adjusts the programs after they are grouped by output.
pub type DecoratorFn = fn(&AgentInfo, &Monitor, &mut Programs) -> Result<(), EmitError>;

/// Modifiers run on every emit, in order.
#[derive(Debug, Clone, Default)]
pub struct ConfigModifiers {
    pub decorators: Vec<DecoratorFn>,
    pub filters: Vec<FilterFn>,
}

impl ConfigModifiers {
    /// The modifiers the agent runs with.
    pub fn standard() -> Self {
        Self {
            decorators: vec![inject_monitoring],
            filters: vec![stream_checker],
        }
    }
}

/// Identifier of the injected monitoring program.
pub const MONITORING_PROGRAM_ID: &str = "agent-monitoring";

/// Adds a monitoring program to the monitoring output when monitoring is on.
pub fn inject_monitoring(
    agent_info: &AgentInfo,
    monitor: &Monitor,
    programs: &mut Programs,
) -> Result<(), EmitError> {
    if !monitor.is_enabled() {
        return Ok(());
    }

    let mut spec = toml::Table::new();
    spec.insert("type".into(), "monitoring".into());
    spec.insert("id".into(), MONITORING_PROGRAM_ID.into());
    spec.insert("agent_id".into(), agent_info.id().to_string().into());
    spec.insert("use_output".into(), monitor.use_output().into());

    programs
        .entry(monitor.use_output().to_string())
        .or_default()
        .push(Program {
            id: MONITORING_PROGRAM_ID.to_string(),
            input_type: "monitoring".to_string(),
            spec,
        });
    Ok(())
}

/// Rejects inputs without a string `type` or with malformed `streams`.
pub fn stream_checker(doc: &mut Document) -> Result<(), EmitError> {
    let inputs = match doc.get("inputs") {
        None => return Ok(()),
        Some(toml::Value::Array(inputs)) => inputs,
        Some(_) => {
            return Err(EmitError::InvalidInput {
                index: 0,
                reason: "`inputs` must be an array of tables".into(),
            })
        }
    };

    for (index, input) in inputs.iter().enumerate() {
        let invalid = |reason: &str| EmitError::InvalidInput {
            index,
            reason: reason.to_string(),
        };

        let table = input
            .as_table()
            .ok_or_else(|| invalid("input must be a table"))?;

        match table.get("type").and_then(|t| t.as_str()) {
            Some(t) if !t.is_empty() => {}
            _ => return Err(invalid("missing input type")),
        }

        match table.get("streams") {
            None => {}
            Some(toml::Value::Array(streams)) if streams.iter().all(|s| s.is_table()) => {}
            Some(_) => return Err(invalid("`streams` must be an array of tables")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitoringConfig;

    #[test]
    fn test_stream_checker() {
        let mut ok: Document = toml::from_str(
            "[[inputs]]\ntype = \"logfile\"\n[[inputs.streams]]\npaths = [\"/var/log/*.log\"]\n",
        )
        .unwrap();
        assert!(stream_checker(&mut ok).is_ok());

        let mut untyped: Document = toml::from_str("[[inputs]]\nid = \"x\"\n").unwrap();
        assert!(matches!(
            stream_checker(&mut untyped),
            Err(EmitError::InvalidInput { index: 0, .. })
        ));

        let mut bad_streams: Document =
            toml::from_str("[[inputs]]\ntype = \"a\"\n[[inputs]]\ntype = \"b\"\nstreams = [1]\n")
                .unwrap();
        assert!(matches!(
            stream_checker(&mut bad_streams),
            Err(EmitError::InvalidInput { index: 1, .. })
        ));
    }

    #[test]
    fn test_inject_monitoring() {
        let info = AgentInfo::new();
        let mut programs = Programs::new();

        let off = Monitor::new(&MonitoringConfig::default()).unwrap();
        inject_monitoring(&info, &off, &mut programs).unwrap();
        assert!(programs.is_empty());

        let on = Monitor::new(&MonitoringConfig {
            enabled: true,
            use_output: "monitoring".into(),
            ..MonitoringConfig::default()
        })
        .unwrap();
        inject_monitoring(&info, &on, &mut programs).unwrap();
        let injected = &programs["monitoring"];
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].id, MONITORING_PROGRAM_ID);
        assert_eq!(
            injected[0].spec["agent_id"].as_str(),
            Some(info.id().to_string().as_str())
        );
    }
}
