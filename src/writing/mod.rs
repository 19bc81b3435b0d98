//! Sinks that persist flushed traces.
//!
//! A tracer only formats; a `Writer` decides where the bytes go and a
//! `SaveFn` decides how the payload is encoded into them.

pub mod file;
pub mod memory;

use std::io;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

pub use file::FileWriter;
pub use memory::MemoryWriter;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode {target}: {source}")]
    Encode {
        target: String,
        #[source]
        source: io::Error,
    },
}

/// Encodes a payload onto an output stream.
pub trait SaveFn: Send + Sync {
    fn save(&self, payload: &Value, out: &mut dyn io::Write) -> io::Result<()>;
}

/// Persists `payload` under `target` through `save_fn`.
///
/// `out_dir` is a hint; writers with their own destination ignore it.
pub trait Writer: Send + Sync {
    fn write(
        &self,
        target: &str,
        out_dir: &Path,
        payload: &Value,
        save_fn: &dyn SaveFn,
    ) -> Result<(), WriteError>;
}
