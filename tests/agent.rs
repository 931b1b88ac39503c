//! Orchestration order of LocalAgent start and stop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use local_agent::agent::{AgentInfo, AgentParts, LocalAgent};
use local_agent::source::SourceState;
use local_agent::AgentError;

mod common;
use common::{events, recorded, Events, MockListener, MockRouter, MockSource};

#[derive(Default, Clone, Copy)]
struct Failures {
    listener_start: bool,
    listener_stop: bool,
    source_start: bool,
    source_stop: bool,
    router_shutdown: bool,
}

fn agent(failures: Failures) -> (LocalAgent, Events, CancellationToken) {
    let events = events();
    let ctx = CancellationToken::new();
    let agent = LocalAgent::from_parts(AgentParts {
        ctx: ctx.clone(),
        agent_info: Arc::new(AgentInfo::new()),
        listener: Box::new(MockListener {
            events: events.clone(),
            fail_start: failures.listener_start,
            fail_stop: failures.listener_stop,
        }),
        router: Arc::new(MockRouter {
            events: events.clone(),
            fail_shutdown: failures.router_shutdown,
        }),
        source: Box::new(MockSource {
            events: events.clone(),
            fail_start: failures.source_start,
            fail_stop: failures.source_stop,
            state: SourceState::Idle,
        }),
    });
    (agent, events, ctx)
}

#[tokio::test]
async fn test_start_then_stop_in_order() {
    let (agent, events, ctx) = agent(Failures::default());

    agent.start().await.unwrap();
    assert!(!ctx.is_cancelled());
    agent.stop().await.unwrap();

    assert!(ctx.is_cancelled());
    assert_eq!(
        recorded(&events),
        vec![
            "listener.start",
            "source.start",
            "source.stop",
            "router.shutdown",
            "listener.stop",
        ]
    );
}

#[tokio::test]
async fn test_listener_failure_aborts_start() {
    let (agent, events, _) = agent(Failures {
        listener_start: true,
        ..Failures::default()
    });

    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, AgentError::Listener(_)));
    assert_eq!(recorded(&events), vec!["listener.start"]);
}

#[tokio::test]
async fn test_source_failure_rolls_back_listener() {
    let (agent, events, _) = agent(Failures {
        source_start: true,
        ..Failures::default()
    });

    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, AgentError::Source(ref e) if e.is_no_configuration()));
    assert_eq!(
        recorded(&events),
        vec!["listener.start", "source.start", "listener.stop"]
    );
}

#[tokio::test]
async fn test_stop_runs_every_step_despite_failures() {
    let (agent, events, ctx) = agent(Failures {
        source_stop: true,
        router_shutdown: true,
        ..Failures::default()
    });

    agent.start().await.unwrap();
    let err = agent.stop().await.unwrap_err();

    let AgentError::Shutdown(errors) = err else {
        panic!("expected aggregated shutdown error");
    };
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], AgentError::Source(_)));
    assert!(matches!(errors[1], AgentError::Router(_)));

    assert!(ctx.is_cancelled());
    assert_eq!(
        recorded(&events),
        vec![
            "listener.start",
            "source.start",
            "source.stop",
            "router.shutdown",
            "listener.stop",
        ]
    );
}

#[tokio::test]
async fn test_listener_stop_failure_is_reported() {
    let (agent, _, _) = agent(Failures {
        listener_stop: true,
        ..Failures::default()
    });

    agent.start().await.unwrap();
    let err = agent.stop().await.unwrap_err();
    assert!(matches!(err, AgentError::Shutdown(ref errors) if errors.len() == 1));
}
