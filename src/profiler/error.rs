use thiserror::Error;

use super::tracer::TracerKind;
use crate::writing::WriteError;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("tracer requested as {requested:?} but the active tracer is {active:?}")]
    KindMismatch {
        requested: TracerKind,
        active: TracerKind,
    },

    #[error("malformed trace data: {0}")]
    Format(#[from] serde_json::Error),

    #[error("failed to write trace: {0}")]
    Write(#[from] WriteError),
}
