//! Route dispatch.
//!
//! # Responsibilities
//! - Keep one stream per output (route)
//! - Diff each apply against the current streams: create, update, close
//! - Publish the route inventory for lock-free readers
//!
//! # Design Decisions
//! - Applies are serialized by a mutex; last applied wins
//! - Applying the same programs twice is a no-op and does not bump the version
//! - Stream operations are synchronous, so an apply is never half done

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::observability::metrics;
use crate::pipeline::{PipelineRouter, Programs, RouterError, Stream, StreamFactory};

#[derive(Debug, Default)]
struct RouterState {
    streams: BTreeMap<String, Stream>,
    applied: Option<Programs>,
    closed: bool,
}

/// Routes programs to per-output streams.
#[derive(Debug)]
pub struct StreamRouter {
    factory: StreamFactory,
    state: Mutex<RouterState>,
    inventory: ArcSwap<BTreeSet<String>>,
    version: AtomicU64,
}

impl StreamRouter {
    pub fn new(factory: StreamFactory) -> Self {
        Self {
            factory,
            state: Mutex::new(RouterState::default()),
            inventory: ArcSwap::from_pointee(BTreeSet::new()),
            version: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PipelineRouter for StreamRouter {
    async fn route(&self, programs: Programs) -> Result<(), RouterError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(RouterError::Closed);
        }
        if state.applied.as_ref() == Some(&programs) {
            tracing::debug!("Configuration unchanged, nothing to route");
            return Ok(());
        }

        let removed: Vec<String> = state
            .streams
            .keys()
            .filter(|output| !programs.contains_key(*output))
            .cloned()
            .collect();
        for output in removed {
            if let Some(stream) = state.streams.remove(&output) {
                stream.close();
            }
        }

        for (output, group) in &programs {
            let unchanged = state
                .streams
                .get(output)
                .is_some_and(|stream| stream.programs() == group.as_slice());
            if unchanged {
                continue;
            }
            let stream = state
                .streams
                .entry(output.clone())
                .or_insert_with(|| self.factory.create(output));
            stream.update(group.clone());
        }

        let routes: BTreeSet<String> = state.streams.keys().cloned().collect();
        let route_count = routes.len();
        self.inventory.store(Arc::new(routes));
        state.applied = Some(programs);
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;

        metrics::record_applied(route_count);
        tracing::info!(version, routes = route_count, "Configuration routed");
        Ok(())
    }

    fn routes(&self) -> BTreeSet<String> {
        BTreeSet::clone(&self.inventory.load())
    }

    fn applied_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> Result<(), RouterError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let streams = std::mem::take(&mut state.streams);
        for (_, stream) in streams {
            stream.close();
        }
        self.inventory.store(Arc::new(BTreeSet::new()));
        tracing::info!("Pipeline router shut down");
        Ok(())
    }
}
