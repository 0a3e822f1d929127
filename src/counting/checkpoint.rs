#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Resumable checkpoint persistence.
//!
//! A checkpoint captures how far a run got for one `(v, l, c)` triple:
//! completed work units, the partial count, and the elapsed time banked so
//! far. Writes are atomic (temp file + rename) so a crash mid-write can
//! never surface as a half-valid document. On load, anything suspicious is
//! treated as absent rather than guessed at: a mismatched parameter triple,
//! zero progress, or progress at or beyond the total. A file that exists
//! but does not parse is a hard `ConfigError`; the engine never silently
//! discards what looks like real prior work.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Default directory for checkpoint documents.
pub const CHECKPOINT_DIR: &str = "Checkpoints";

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Variable count of the run.
    pub v: u32,
    /// Clause width of the run.
    pub l: u32,
    /// Clause count of the run.
    pub c: u32,
    /// Completed work units (chunks for the chunked engines, combinations
    /// for the sequential many-vars engine).
    pub processed_units: u64,
    /// Contributions accumulated over the completed units.
    pub partial_count: u64,
    /// Wall time spent before this checkpoint was written, in milliseconds.
    pub elapsed_ms_before_checkpoint: u64,
    /// Seconds since the Unix epoch at write time.
    pub last_updated: u64,
}

/// Store bound to one parameter triple.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
    v: u32,
    l: u32,
    c: u32,
}

impl CheckpointStore {
    /// Binds the store to `dir/checkpoint_v{V}_l{L}_c{C}.json`.
    #[must_use]
    pub fn new(dir: &Path, v: u32, l: u32, c: u32) -> Self {
        Self {
            path: dir.join(format!("checkpoint_v{v}_l{l}_c{c}.json")),
            v,
            l,
            c,
        }
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a checkpoint atomically.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors from the temp write or the rename.
    pub fn save(&self, processed_units: u64, partial_count: u64, elapsed_ms: u64) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = Checkpoint {
            v: self.v,
            l: self.l,
            c: self.c,
            processed_units,
            partial_count,
            elapsed_ms_before_checkpoint: elapsed_ms,
            last_updated: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), processed_units, "checkpoint written");
        Ok(())
    }

    /// Loads a usable checkpoint, if any.
    ///
    /// Returns `None` when the file is missing, carries a different
    /// parameter triple (ignored with a warning), or describes no usable
    /// progress (`processed_units` zero or at/beyond `total_units`).
    ///
    /// # Errors
    ///
    /// `ConfigError::CorruptCheckpoint` when the file exists but is not
    /// valid JSON for the document shape.
    pub fn load(&self, total_units: u64) -> Result<Option<Checkpoint>, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::CorruptCheckpoint {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };
        let doc: Checkpoint =
            serde_json::from_str(&text).map_err(|e| ConfigError::CorruptCheckpoint {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if (doc.v, doc.l, doc.c) != (self.v, self.l, self.c) {
            warn!(
                path = %self.path.display(),
                "checkpoint is for v={}, l={}, c={}; ignoring it",
                doc.v, doc.l, doc.c
            );
            return Ok(None);
        }
        if doc.processed_units == 0 || doc.processed_units >= total_units {
            return Ok(None);
        }
        Ok(Some(doc))
    }

    /// Removes the document; missing files are fine.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors other than `NotFound`.
    pub fn delete(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
