//! Load-once configuration source.

use async_trait::async_trait;

use crate::observability::metrics;
use crate::source::{ConfigSource, ReloadCycle, SourceError, SourceState};

/// Applies the configuration a single time on `start`.
pub struct Once {
    cycle: ReloadCycle,
    state: SourceState,
}

impl Once {
    pub fn new(cycle: ReloadCycle) -> Self {
        Self {
            cycle,
            state: SourceState::Idle,
        }
    }
}

#[async_trait]
impl ConfigSource for Once {
    async fn start(&mut self) -> Result<(), SourceError> {
        if self.state != SourceState::Idle {
            return Err(SourceError::AlreadyStarted);
        }
        self.state = SourceState::Starting;

        match self.cycle.run().await {
            Ok(files) => {
                metrics::record_cycle("once", true);
                tracing::info!(files, "Configuration applied");
                self.state = SourceState::Running;
                Ok(())
            }
            Err(e) => {
                metrics::record_cycle("once", false);
                self.state = SourceState::Stopped;
                Err(e)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), SourceError> {
        self.state = SourceState::Stopped;
        Ok(())
    }

    fn state(&self) -> SourceState {
        self.state
    }
}
