use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profiler::MaxEventCount;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tracer config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tracer config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings applied to tracers built by a `TracerRegistry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// `null` keeps every span.
    pub max_event_count: MaxEventCount,
    pub enable: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            max_event_count: MaxEventCount::Unbounded,
            enable: true,
        }
    }
}

impl TracerConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_max_event_count(mut self, max_event_count: impl Into<MaxEventCount>) -> Self {
        self.max_event_count = max_event_count.into();
        self
    }

    pub fn with_enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }
}
