//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use local_agent::config::{ConfigLoader, Document};
use local_agent::control::{ControlListener, ListenerError};
use local_agent::discovery::{Discoverer, DiscoveryError};
use local_agent::pipeline::{Emit, EmitError, PipelineRouter, Programs, RouterError};
use local_agent::source::{ConfigSource, ReloadCycle, SourceError, SourceState};

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// A reload cycle over `dir/*.toml`, with `dir/inputs.d/*.toml` as external inputs.
pub fn cycle_for(dir: &Path, emit: Arc<dyn Emit>) -> ReloadCycle {
    let discoverer = Discoverer::new([
        format!("{}/*.toml", dir.display()),
        format!("{}/inputs.d/*.toml", dir.display()),
    ]);
    let loader = ConfigLoader::new(&format!("{}/inputs.d/*.toml", dir.display())).unwrap();
    ReloadCycle::new(discoverer, loader, emit)
}

/// Emit sink counting calls; can delay and fail the first calls.
#[derive(Default)]
pub struct CountingEmit {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub last: Mutex<Option<Document>>,
    delay: Duration,
    fail_first: usize,
}

impl CountingEmit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Emit for CountingEmit {
    async fn emit(&self, doc: Document) -> Result<(), EmitError> {
        let call = self.started.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finished.fetch_add(1, Ordering::SeqCst);

        if call < self.fail_first {
            return Err(EmitError::InvalidInput {
                index: 0,
                reason: "rejected by test".into(),
            });
        }
        *self.last.lock().unwrap() = Some(doc);
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Ordered record of lifecycle calls made on the mocks.
pub type Events = Arc<Mutex<Vec<&'static str>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(events: &Events) -> Vec<&'static str> {
    events.lock().unwrap().clone()
}

pub struct MockListener {
    pub events: Events,
    pub fail_start: bool,
    pub fail_stop: bool,
}

#[async_trait]
impl ControlListener for MockListener {
    async fn start(&mut self) -> Result<(), ListenerError> {
        self.events.lock().unwrap().push("listener.start");
        if self.fail_start {
            return Err(ListenerError::Bind(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            )));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ListenerError> {
        self.events.lock().unwrap().push("listener.stop");
        if self.fail_stop {
            return Err(ListenerError::AlreadyStarted);
        }
        Ok(())
    }
}

pub struct MockSource {
    pub events: Events,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub state: SourceState,
}

#[async_trait]
impl ConfigSource for MockSource {
    async fn start(&mut self) -> Result<(), SourceError> {
        self.events.lock().unwrap().push("source.start");
        if self.fail_start {
            self.state = SourceState::Stopped;
            return Err(SourceError::Discovery(DiscoveryError::NoConfiguration));
        }
        self.state = SourceState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SourceError> {
        self.events.lock().unwrap().push("source.stop");
        self.state = SourceState::Stopped;
        if self.fail_stop {
            return Err(SourceError::AlreadyStarted);
        }
        Ok(())
    }

    fn state(&self) -> SourceState {
        self.state
    }
}

pub struct MockRouter {
    pub events: Events,
    pub fail_shutdown: bool,
}

#[async_trait]
impl PipelineRouter for MockRouter {
    async fn route(&self, _programs: Programs) -> Result<(), RouterError> {
        Ok(())
    }

    fn routes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn applied_version(&self) -> u64 {
        0
    }

    async fn shutdown(&self) -> Result<(), RouterError> {
        self.events.lock().unwrap().push("router.shutdown");
        if self.fail_shutdown {
            return Err(RouterError::Closed);
        }
        Ok(())
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
