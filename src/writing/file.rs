use std::fs::{self, File};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{SaveFn, WriteError, Writer};

/// Writes each target as a file inside a fixed directory.
///
/// Output goes to a `.tmp` sibling first and is renamed into place, so a
/// reader never sees a half-written trace.
#[derive(Debug, Clone)]
pub struct FileWriter {
    out_dir: PathBuf,
}

impl FileWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl Writer for FileWriter {
    fn write(
        &self,
        target: &str,
        _out_dir: &Path,
        payload: &Value,
        save_fn: &dyn SaveFn,
    ) -> Result<(), WriteError> {
        fs::create_dir_all(&self.out_dir)?;
        let dest = self.out_dir.join(target);
        let tmp = self.out_dir.join(format!("{target}.tmp"));

        let mut out = BufWriter::new(File::create(&tmp)?);
        let encoded = save_fn
            .save(payload, &mut out)
            .and_then(|_| out.flush());
        if let Err(source) = encoded {
            drop(out);
            let _ = fs::remove_file(&tmp);
            return Err(WriteError::Encode {
                target: target.to_string(),
                source,
            });
        }
        drop(out);

        if let Err(err) = fs::rename(&tmp, &dest) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        debug!("Wrote {}", dest.display());
        Ok(())
    }
}
