//! Registry of running streams, shared between the pipeline and the listener.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

/// Status of one stream as shown by the control listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamStatus {
    pub output: String,
    pub programs: Vec<String>,
    pub monitored: bool,
}

/// Cheaply cloneable handle to the stream registry.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRegistry {
    inner: Arc<ArcSwap<BTreeMap<String, StreamStatus>>>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, status: StreamStatus) {
        self.inner.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(status.output.clone(), status.clone());
            next
        });
    }

    pub fn remove(&self, output: &str) {
        self.inner.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.remove(output);
            next
        });
    }

    /// Streams ordered by output name.
    pub fn snapshot(&self) -> Vec<StreamStatus> {
        self.inner.load().values().cloned().collect()
    }

    /// Registered output names, ordered.
    pub fn routes(&self) -> Vec<String> {
        self.inner.load().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(output: &str) -> StreamStatus {
        StreamStatus {
            output: output.to_string(),
            programs: vec![format!("{output}-input")],
            monitored: false,
        }
    }

    #[test]
    fn test_upsert_and_remove() {
        let registry = ApplicationRegistry::new();
        registry.upsert(status("b"));
        registry.upsert(status("a"));
        registry.upsert(status("a"));
        assert_eq!(registry.routes(), vec!["a", "b"]);

        let clone = registry.clone();
        clone.remove("a");
        assert_eq!(registry.routes(), vec!["b"]);
        assert_eq!(registry.snapshot()[0].programs, vec!["b-input"]);
    }
}
