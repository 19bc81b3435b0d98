use std::sync::{Arc, Mutex};

use tracing::info;

use super::error::TraceError;
use super::time::TimeSource;
use super::tracer::{Tracer, TracerKind};
use crate::config::TracerConfig;

/// Holds the one tracer of a run.
///
/// The engine owns the registry and passes it (or the handles it returns)
/// to whatever needs to trace. The first request fixes the tracer kind for
/// the registry's lifetime.
#[derive(Debug, Default)]
pub struct TracerRegistry {
    config: TracerConfig,
    clock: TimeSource,
    slot: Mutex<Option<Arc<Tracer>>>,
}

impl TracerRegistry {
    pub fn new(config: TracerConfig) -> Self {
        Self::with_time_source(config, TimeSource::host())
    }

    /// Registry whose recorders close spans through `clock`'s device barrier.
    pub fn with_time_source(config: TracerConfig, clock: TimeSource) -> Self {
        Self {
            config,
            clock,
            slot: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Returns the active tracer, building a `kind` tracer on first use.
    pub fn get_tracer(&self, kind: TracerKind) -> Result<Arc<Tracer>, TraceError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let tracer = slot.get_or_insert_with(|| {
            info!("Constructing {} tracer", kind);
            Arc::new(Tracer::build(kind, &self.config, self.clock.clone()))
        });
        if tracer.kind() != kind {
            return Err(TraceError::KindMismatch {
                requested: kind,
                active: tracer.kind(),
            });
        }
        Ok(Arc::clone(tracer))
    }

    pub fn current(&self) -> Option<Arc<Tracer>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Clears the active tracer's buffer; the tracer itself stays registered.
    /// With nothing active yet, the default Chrome tracer is built first.
    pub fn clear_tracer(&self) -> Result<(), TraceError> {
        let tracer = match self.current() {
            Some(tracer) => tracer,
            None => self.get_tracer(TracerKind::Chrome)?,
        };
        tracer.clear();
        Ok(())
    }
}
