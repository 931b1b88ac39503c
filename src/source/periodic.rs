//! Periodic-reload configuration source.
//!
//! # Responsibilities
//! - Apply the configuration once synchronously on `start`
//! - Re-run the cycle every period on a background task
//! - Keep the schedule alive across failing cycles
//!
//! # Design Decisions
//! - Two tokens: the stop token ends the schedule between cycles, the
//!   background token also abandons a cycle at its next suspension point
//! - The stop token is a child of the background token
//! - Missed ticks are skipped, never queued
//! - `stop` joins the task, so no cycle runs after it returns

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::source::{ConfigSource, ReloadCycle, SourceError, SourceState};

/// Reloads the configuration on a fixed period until stopped.
pub struct Periodic {
    cycle: ReloadCycle,
    period: Duration,
    ctx: CancellationToken,
    stop: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    cycles: Arc<AtomicU64>,
    state: SourceState,
}

impl Periodic {
    /// `ctx` is the background token; cancelling it unwinds the reload task.
    pub fn new(cycle: ReloadCycle, period: Duration, ctx: CancellationToken) -> Self {
        Self {
            cycle,
            period,
            ctx,
            stop: None,
            task: None,
            cycles: Arc::new(AtomicU64::new(0)),
            state: SourceState::Idle,
        }
    }

    /// Number of completed cycles, failed ones included.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigSource for Periodic {
    async fn start(&mut self) -> Result<(), SourceError> {
        if self.state != SourceState::Idle {
            return Err(SourceError::AlreadyStarted);
        }
        self.state = SourceState::Starting;

        let result = self.cycle.run().await;
        self.cycles.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(files) => {
                metrics::record_cycle("periodic", true);
                tracing::info!(files, "Initial configuration applied");
            }
            Err(e) => {
                metrics::record_cycle("periodic", false);
                tracing::error!(error = %e, "Initial configuration failed, retrying on next period");
            }
        }

        let stop = self.ctx.child_token();
        self.task = Some(tokio::spawn(reload_loop(
            self.cycle.clone(),
            self.period,
            self.ctx.clone(),
            stop.clone(),
            self.cycles.clone(),
        )));
        self.stop = Some(stop);
        self.state = SourceState::Running;

        tracing::debug!(period = ?self.period, "Periodic reload scheduled");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SourceError> {
        if let Some(stop) = self.stop.take() {
            stop.cancel();
        }
        if let Some(task) = self.task.take() {
            self.state = SourceState::Stopping;
            if let Err(e) = task.await {
                self.state = SourceState::Stopped;
                return Err(e.into());
            }
        }
        self.state = SourceState::Stopped;
        Ok(())
    }

    fn state(&self) -> SourceState {
        self.state
    }
}

impl Drop for Periodic {
    fn drop(&mut self) {
        if let Some(stop) = &self.stop {
            stop.cancel();
        }
    }
}

async fn reload_loop(
    cycle: ReloadCycle,
    period: Duration,
    ctx: CancellationToken,
    stop: CancellationToken,
    cycles: Arc<AtomicU64>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                tracing::debug!("Reload cycle abandoned, agent is stopping");
                break;
            }
            result = cycle.run() => result,
        };
        cycles.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(files) => {
                metrics::record_cycle("periodic", true);
                tracing::debug!(files, "Configuration reloaded");
            }
            Err(e) => {
                metrics::record_cycle("periodic", false);
                tracing::error!(error = %e, "Configuration reload failed, keeping current configuration");
            }
        }
    }

    tracing::debug!("Periodic reload stopped");
}
