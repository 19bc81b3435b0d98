use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, warn};

use super::error::TraceError;
use super::event::TraceEvent;
use super::format::{self, ChromeTracingSaveFunc};
use super::state::{MaxEventCount, RecorderState};
use super::time::{current_thread_id, DeviceSync, TimeSource};
use crate::config::TracerConfig;
use crate::writing::Writer;

/// Recorder producing Chrome trace-viewer "complete" events.
///
/// Spans may finish on any thread. The buffer keeps completion order only;
/// nothing orders events across threads.
#[derive(Debug)]
pub struct ChromeTracer {
    enabled: AtomicBool,
    events: Mutex<Vec<TraceEvent>>,
    max_event_count: Mutex<MaxEventCount>,
    event_count: AtomicU64,
    cap_reported: AtomicBool,
    clock: TimeSource,
    pid: u32,
}

impl ChromeTracer {
    pub fn new(max_event_count: MaxEventCount, enable: bool) -> Self {
        Self::with_time_source(max_event_count, enable, TimeSource::host())
    }

    pub fn from_config(config: &TracerConfig, clock: TimeSource) -> Self {
        Self::with_time_source(config.max_event_count, config.enable, clock)
    }

    /// Recorder that waits on `device` before closing each recorded span.
    pub fn with_device(
        max_event_count: MaxEventCount,
        enable: bool,
        device: Arc<dyn DeviceSync>,
    ) -> Self {
        Self::with_time_source(max_event_count, enable, TimeSource::with_device(device))
    }

    pub fn with_time_source(max_event_count: MaxEventCount, enable: bool, clock: TimeSource) -> Self {
        Self {
            enabled: AtomicBool::new(enable),
            events: Mutex::new(Vec::new()),
            max_event_count: Mutex::new(max_event_count),
            event_count: AtomicU64::new(0),
            cap_reported: AtomicBool::new(false),
            clock,
            pid: std::process::id(),
        }
    }

    /// Opens a span closed when the returned guard drops, unwinding included.
    pub fn add_event(&self, name: impl Into<String>) -> ChromeSpan<'_> {
        ChromeSpan {
            tracer: self,
            name: name.into(),
            begin: self.clock.now(),
        }
    }

    /// Runs `f` inside a span and hands its result back untouched.
    pub fn trace<T>(&self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let _span = self.add_event(name);
        f()
    }

    /// Span covering `fut` from the first poll until it resolves.
    pub async fn instrument<F: Future>(&self, name: impl Into<String>, fut: F) -> F::Output {
        let _span = self.add_event(name);
        fut.await
    }

    pub fn enable(&self, enable_flag: bool) {
        self.enabled.store(enable_flag, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        let mut events = self.lock_events();
        debug!("Clearing {} trace events", events.len());
        events.clear();
        self.event_count.store(0, Ordering::SeqCst);
        self.cap_reported.store(false, Ordering::Relaxed);
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    pub fn max_event_count(&self) -> MaxEventCount {
        *self
            .max_event_count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Copy of the buffer in completion order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.lock_events().clone()
    }

    /// Hands the buffer to `writer` as a JSON array under `filename`.
    /// Nothing is written while disabled.
    pub fn flush(&self, filename: &str, writer: &dyn Writer) -> Result<(), TraceError> {
        if !self.is_enabled() {
            debug!("Tracer disabled, skipping flush of {}", filename);
            return Ok(());
        }
        let payload = {
            let events = self.lock_events();
            debug!("Flushing {} trace events to {}", events.len(), filename);
            format::events_to_value(&events)?
        };
        // The writer owns its destination, the directory hint stays empty.
        writer.write(filename, Path::new(""), &payload, &ChromeTracingSaveFunc)?;
        Ok(())
    }

    pub fn state_dict(&self) -> Result<RecorderState, TraceError> {
        let event_list = format::events_to_string(&self.lock_events())?;
        Ok(RecorderState {
            enable: self.is_enabled(),
            event_list,
            max_event_count: self.max_event_count(),
            event_count: self.event_count(),
        })
    }

    /// Replaces the whole recorder state. Producers must be paused; a
    /// malformed event list leaves the recorder untouched.
    pub fn load_state_dict(&self, state: &RecorderState) -> Result<(), TraceError> {
        let restored = format::events_from_str(&state.event_list)?;
        let mut events = self.lock_events();
        debug!(
            "Restoring {} trace events (counter {})",
            restored.len(),
            state.event_count
        );
        *events = restored;
        self.enabled.store(state.enable, Ordering::SeqCst);
        *self
            .max_event_count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state.max_event_count;
        self.event_count.store(state.event_count, Ordering::SeqCst);
        self.cap_reported.store(false, Ordering::Relaxed);
        Ok(())
    }

    // Appends never leave a partial entry behind, so a poisoned lock still
    // guards a consistent buffer.
    fn lock_events(&self) -> MutexGuard<'_, Vec<TraceEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims one slot below the cap, or reports the cap as reached.
    fn reserve_slot(&self) -> bool {
        let max = self.max_event_count();
        let reserved = self
            .event_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                max.allows(count).then(|| count + 1)
            })
            .is_ok();
        if !reserved && !self.cap_reported.swap(true, Ordering::Relaxed) {
            warn!("Trace event cap {:?} reached, dropping further spans", max);
        }
        reserved
    }

    fn finish_span(&self, name: String, begin: Instant) {
        if !self.is_enabled() || !self.reserve_slot() {
            return;
        }
        self.clock.synchronize();
        let end = self.clock.now();
        let event = TraceEvent::complete(
            name,
            self.clock.micros_since_epoch(begin),
            end.saturating_duration_since(begin).as_nanos() as f64 / 1000.0,
            self.pid,
            current_thread_id(),
        );
        self.lock_events().push(event);
    }
}

impl Default for ChromeTracer {
    fn default() -> Self {
        Self::new(MaxEventCount::Unbounded, true)
    }
}

/// Open span of a `ChromeTracer`.
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct ChromeSpan<'a> {
    tracer: &'a ChromeTracer,
    name: String,
    begin: Instant,
}

impl Drop for ChromeSpan<'_> {
    fn drop(&mut self) {
        let name = std::mem::take(&mut self.name);
        self.tracer.finish_span(name, self.begin);
    }
}
