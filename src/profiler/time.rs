use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// Shared monotonic epoch, so spans from every recorder in the process line up.
static TRACE_EPOCH: OnceLock<Instant> = OnceLock::new();

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Stable per-thread integer used as the event `tid`.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// Barrier over an asynchronous accelerator.
///
/// `synchronize` must block until every piece of work issued so far has
/// completed, otherwise span durations only measure issue time.
pub trait DeviceSync: Send + Sync {
    fn is_available(&self) -> bool;
    fn synchronize(&self);
}

/// Host-only execution, nothing to wait for.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuOnly;

impl DeviceSync for CpuOnly {
    fn is_available(&self) -> bool {
        false
    }

    fn synchronize(&self) {}
}

/// Clock plus optional device barrier used by the recorder.
#[derive(Clone)]
pub struct TimeSource {
    epoch: Instant,
    device: Option<Arc<dyn DeviceSync>>,
}

impl TimeSource {
    /// Clock with no device barrier.
    pub fn host() -> Self {
        Self {
            epoch: *TRACE_EPOCH.get_or_init(Instant::now),
            device: None,
        }
    }

    /// Availability is probed once here; an unavailable device is dropped
    /// so the hot path never pays for it.
    pub fn with_device(device: Arc<dyn DeviceSync>) -> Self {
        let mut source = Self::host();
        if device.is_available() {
            source.device = Some(device);
        }
        source
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn now(&self) -> Instant {
        Instant::now()
    }

    pub fn synchronize(&self) {
        if let Some(device) = &self.device {
            device.synchronize();
        }
    }

    /// Microseconds from the trace epoch to `at`.
    pub fn micros_since_epoch(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.epoch).as_nanos() as f64 / 1000.0
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::host()
    }
}

impl std::fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSource")
            .field("epoch", &self.epoch)
            .field("device", &self.device.is_some())
            .finish()
    }
}
