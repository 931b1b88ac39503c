//! End-to-end: a LocalAgent reading configuration files from a temp directory.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use local_agent::agent::{AgentInfo, LocalAgent, LocalAgentOptions};
use local_agent::config::loader;
use local_agent::paths::Paths;
use local_agent::upgrade::{ReexecManager, UpgradeError, UpgraderSlot};
use local_agent::AgentError;

mod common;
use common::{eventually, write_file};

#[derive(Default)]
struct CountingReexec {
    calls: AtomicUsize,
}

impl ReexecManager for CountingReexec {
    fn reexec(&self, _artifact_uri: &str) -> Result<(), UpgradeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn agent_header(reload: bool, period_ms: u64) -> String {
    format!(
        r#"
[agent.control]
bind_address = "127.0.0.1:0"

[agent.reload]
enabled = {reload}
period_ms = {period_ms}
"#
    )
}

const PIPELINE: &str = r#"
[outputs.default]
hosts = ["localhost:9200"]

[[inputs]]
id = "app-logs"
type = "logfile"
"#;

fn build(
    dir: &Path,
    parent: &CancellationToken,
    slot: Arc<UpgraderSlot>,
) -> Result<LocalAgent, AgentError> {
    let config_file = dir.join("agent.toml");
    let raw_config = loader::load_file(&config_file).unwrap();
    LocalAgent::new(
        parent,
        LocalAgentOptions {
            config_file,
            paths: Paths::with_config_dir(dir),
            raw_config,
            agent_info: Arc::new(AgentInfo::new()),
            reexec: Arc::new(CountingReexec::default()),
            upgrader_control: slot,
        },
    )
}

fn routes(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_load_once_applies_configuration() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        &format!("{}\n{}", agent_header(false, 10), PIPELINE),
    );

    let slot = Arc::new(UpgraderSlot::new());
    let agent = build(dir.path(), &CancellationToken::new(), slot.clone()).unwrap();
    assert!(slot.upgrader().is_some());
    assert_eq!(agent.applied_version(), 0);

    agent.start().await.unwrap();
    assert_eq!(agent.applied_version(), 1);
    assert_eq!(agent.routes(), routes(&["default"]));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.applied_version(), 1);

    agent.stop().await.unwrap();
    assert!(agent.background_token().is_cancelled());
    assert!(agent.routes().is_empty());
}

#[tokio::test]
async fn test_external_inputs_add_routes() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        &format!(
            "{}\n{}\n[outputs.archive]\npath = \"/tmp/archive\"\n",
            agent_header(false, 10),
            PIPELINE
        ),
    );
    write_file(
        dir.path(),
        "inputs.d/system.toml",
        "[[inputs]]\ntype = \"system/metrics\"\nuse_output = \"archive\"\n",
    );

    let agent = build(dir.path(), &CancellationToken::new(), Arc::new(UpgraderSlot::new())).unwrap();
    agent.start().await.unwrap();
    assert_eq!(agent.routes(), routes(&["archive", "default"]));
    agent.stop().await.unwrap();
}

#[tokio::test]
async fn test_periodic_reload_follows_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let header = agent_header(true, 10);
    write_file(dir.path(), "agent.toml", &format!("{header}\n{PIPELINE}"));

    let agent = build(dir.path(), &CancellationToken::new(), Arc::new(UpgraderSlot::new())).unwrap();
    agent.start().await.unwrap();
    assert_eq!(agent.routes(), routes(&["default"]));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(agent.applied_version(), 1, "unchanged files are not re-applied");

    write_file(
        dir.path(),
        "agent.toml",
        &format!(
            "{header}\n[outputs.archive]\npath = \"/tmp/archive\"\n\n[[inputs]]\ntype = \"journald\"\nuse_output = \"archive\"\n"
        ),
    );
    assert!(
        eventually(Duration::from_secs(2), || agent.routes() == routes(&["archive"])).await,
        "routes never reflected the rewritten file"
    );
    assert!(agent.applied_version() >= 2);

    agent.stop().await.unwrap();
}

#[tokio::test]
async fn test_invalid_settings_fail_construction() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        "[agent.control]\nbind_address = \"not an address\"\n",
    );

    let err = build(dir.path(), &CancellationToken::new(), Arc::new(UpgraderSlot::new()))
        .err()
        .unwrap();
    assert!(matches!(err, AgentError::Construction { stage, .. } if stage == "validate agent settings"));
}

#[tokio::test]
async fn test_missing_outputs_fail_load_once_start() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        &format!("{}\n[[inputs]]\ntype = \"logfile\"\n", agent_header(false, 10)),
    );

    let agent = build(dir.path(), &CancellationToken::new(), Arc::new(UpgraderSlot::new())).unwrap();
    let err = agent.start().await.unwrap_err();
    assert!(matches!(err, AgentError::Source(_)));
    assert_eq!(agent.applied_version(), 0);
    agent.stop().await.unwrap();
}

#[tokio::test]
async fn test_parent_cancellation_reaches_agent() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        &format!("{}\n{}", agent_header(true, 10), PIPELINE),
    );

    let parent = CancellationToken::new();
    let agent = build(dir.path(), &parent, Arc::new(UpgraderSlot::new())).unwrap();
    agent.start().await.unwrap();

    parent.cancel();
    assert!(agent.background_token().is_cancelled());
    agent.stop().await.unwrap();
}

#[tokio::test]
async fn test_upgrade_cancels_background_work() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "agent.toml",
        &format!("{}\n{}", agent_header(true, 10), PIPELINE),
    );

    let slot = Arc::new(UpgraderSlot::new());
    let agent = build(dir.path(), &CancellationToken::new(), slot.clone()).unwrap();
    agent.start().await.unwrap();

    slot.upgrader().unwrap().upgrade("99.0.0").unwrap();
    assert!(agent.background_token().is_cancelled());
    agent.stop().await.unwrap();
}
