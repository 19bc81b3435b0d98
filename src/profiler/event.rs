use serde::{Deserialize, Serialize};

/// Phase marker of a trace-viewer event. Only complete events are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Begin and duration in one record.
    #[serde(rename = "X")]
    Complete,
}

/// One finished span, laid out the way the trace viewer expects it.
///
/// Records are immutable once appended to a recorder buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub name: String,
    /// Reserved, always empty for now.
    pub cat: String,
    pub ph: Phase,
    /// Start, in microseconds since the process trace epoch.
    pub ts: f64,
    /// Duration in microseconds.
    pub dur: f64,
    pub pid: u32,
    pub tid: u64,
}

impl TraceEvent {
    pub fn complete(name: impl Into<String>, ts: f64, dur: f64, pid: u32, tid: u64) -> Self {
        Self {
            name: name.into(),
            cat: String::new(),
            ph: Phase::Complete,
            ts,
            dur,
            pid,
            tid,
        }
    }

    pub fn end(&self) -> f64 {
        self.ts + self.dur
    }
}
