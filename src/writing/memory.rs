use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use serde_json::Value;

use super::{SaveFn, WriteError, Writer};

/// Keeps encoded outputs in memory, keyed by target.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    outputs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &str) -> Option<Vec<u8>> {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(target)
            .cloned()
    }

    pub fn targets(&self) -> Vec<String> {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

impl Writer for MemoryWriter {
    fn write(
        &self,
        target: &str,
        _out_dir: &Path,
        payload: &Value,
        save_fn: &dyn SaveFn,
    ) -> Result<(), WriteError> {
        let mut bytes = Vec::new();
        save_fn
            .save(payload, &mut bytes)
            .map_err(|source| WriteError::Encode {
                target: target.to_string(),
                source,
            })?;
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(target.to_string(), bytes);
        Ok(())
    }
}
