//! Span recording for training and evaluation loops.
//!
//! A `TracerRegistry` owns the run's `Tracer`. Call sites open spans with
//! `add_event` and keep the returned guard alive around the code they time;
//! the owner clears, toggles and flushes the tracer at epoch boundaries.
//! Flushing hands a trace-viewer JSON array to a `Writer`.

pub mod error;
pub mod event;
pub mod format;
pub mod recorder;
pub mod registry;
pub mod state;
pub mod time;
pub mod tracer;

pub use error::TraceError;
pub use event::{Phase, TraceEvent};
pub use format::ChromeTracingSaveFunc;
pub use recorder::{ChromeSpan, ChromeTracer};
pub use registry::TracerRegistry;
pub use state::{MaxEventCount, RecorderState};
pub use time::{current_thread_id, CpuOnly, DeviceSync, TimeSource};
pub use tracer::{NoOpTracer, Span, Tracer, TracerKind};
