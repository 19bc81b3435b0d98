use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::error::TraceError;
use super::recorder::{ChromeSpan, ChromeTracer};
use super::time::TimeSource;
use crate::config::TracerConfig;
use crate::writing::Writer;

/// Concrete tracer variants a registry can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracerKind {
    NoOp,
    Chrome,
}

impl fmt::Display for TracerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TracerKind::NoOp => write!(f, "no-op"),
            TracerKind::Chrome => write!(f, "chrome"),
        }
    }
}

/// Tracer that records nothing, for runs where tracing was not requested.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpTracer;

impl NoOpTracer {
    pub fn add_event(&self, _name: impl Into<String>) -> Span<'_> {
        Span::inert()
    }

    pub fn clear(&self) {}

    pub fn enable(&self, _enable_flag: bool) {}

    pub fn flush(&self, _filename: &str, _writer: &dyn Writer) -> Result<(), TraceError> {
        Ok(())
    }
}

/// The tracer handed to call sites.
#[derive(Debug)]
pub enum Tracer {
    NoOp(NoOpTracer),
    Chrome(ChromeTracer),
}

impl Tracer {
    pub fn build(kind: TracerKind, config: &TracerConfig, clock: TimeSource) -> Self {
        match kind {
            TracerKind::NoOp => Tracer::NoOp(NoOpTracer),
            TracerKind::Chrome => Tracer::Chrome(ChromeTracer::from_config(config, clock)),
        }
    }

    pub fn kind(&self) -> TracerKind {
        match self {
            Tracer::NoOp(_) => TracerKind::NoOp,
            Tracer::Chrome(_) => TracerKind::Chrome,
        }
    }

    pub fn add_event(&self, name: impl Into<String>) -> Span<'_> {
        match self {
            Tracer::NoOp(tracer) => tracer.add_event(name),
            Tracer::Chrome(tracer) => Span {
                inner: Some(tracer.add_event(name)),
            },
        }
    }

    pub fn trace<T>(&self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let _span = self.add_event(name);
        f()
    }

    pub async fn instrument<F: Future>(&self, name: impl Into<String>, fut: F) -> F::Output {
        let _span = self.add_event(name);
        fut.await
    }

    pub fn clear(&self) {
        match self {
            Tracer::NoOp(tracer) => tracer.clear(),
            Tracer::Chrome(tracer) => tracer.clear(),
        }
    }

    pub fn enable(&self, enable_flag: bool) {
        match self {
            Tracer::NoOp(tracer) => tracer.enable(enable_flag),
            Tracer::Chrome(tracer) => tracer.enable(enable_flag),
        }
    }

    pub fn flush(&self, filename: &str, writer: &dyn Writer) -> Result<(), TraceError> {
        match self {
            Tracer::NoOp(tracer) => tracer.flush(filename, writer),
            Tracer::Chrome(tracer) => tracer.flush(filename, writer),
        }
    }

    /// The recorder, when this tracer records anything.
    pub fn as_chrome(&self) -> Option<&ChromeTracer> {
        match self {
            Tracer::Chrome(tracer) => Some(tracer),
            Tracer::NoOp(_) => None,
        }
    }
}

/// Guard returned by `Tracer::add_event`.
#[must_use = "the span closes as soon as the guard is dropped"]
pub struct Span<'a> {
    inner: Option<ChromeSpan<'a>>,
}

impl Span<'_> {
    fn inert() -> Self {
        Span { inner: None }
    }

    /// True for spans handed out by the no-op tracer. A Chrome span may
    /// still be dropped at close if the recorder is disabled or capped.
    pub fn is_inert(&self) -> bool {
        self.inner.is_none()
    }
}
