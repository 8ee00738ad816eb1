//! Snapshot persistence for computed batches.
//!
//! After each successful invocation a producer hands its batch to a
//! [`SnapshotSink`]. The sink owns the on-disk representation; producers only
//! log its failures.
//!
//! # Storage Format
//!
//! [`SnapshotWriter`] keeps one file per measurement kind in its directory:
//! - `<kind>.json` — the most recent [`Snapshot`] (batch id, kind, write time
//!   and the readings, oldest first)
//!
//! Each write goes to a temporary file in the same directory and is then
//! renamed over the previous snapshot, so readers never observe a partial
//! file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::reading::{MeasurementKind, Reading};

/// Current snapshot file format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Handoff target for computed batches.
pub trait SnapshotSink: Send + Sync {
    /// Persist `batch`, replacing or extending whatever the sink holds for
    /// `kind`.
    fn persist(&self, kind: MeasurementKind, batch: &[Reading]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Snapshot file
// ---------------------------------------------------------------------------

/// Contents of one snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub batch_id: String,
    pub kind: MeasurementKind,
    pub written_at: DateTime<Utc>,
    pub readings: Vec<Reading>,
}

/// Summary of a snapshot file found on disk.
#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    pub path: PathBuf,
    pub kind: MeasurementKind,
    pub written_at: DateTime<Utc>,
    pub readings: usize,
}

// ---------------------------------------------------------------------------
// Directory-backed writer
// ---------------------------------------------------------------------------

/// Writes one JSON snapshot per kind into a directory.
///
/// `written_at` comes from the writer's clock, which is the system clock
/// unless [`SnapshotWriter::with_clock`] swaps it.
#[derive(Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl SnapshotWriter {
    /// Create a writer, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp snapshots with `clock` instead of the system time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `kind`.
    pub fn path_for(&self, kind: MeasurementKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }

    /// Write `readings` as the current snapshot for `kind`.
    pub fn write(&self, kind: MeasurementKind, readings: &[Reading]) -> Result<PathBuf> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            batch_id: Uuid::new_v4().to_string(),
            kind,
            written_at: self.clock.now(),
            readings: readings.to_vec(),
        };

        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut w, &snapshot)?;
            w.flush()?;
        }
        let path = self.path_for(kind);
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    /// Read the current snapshot for `kind`.
    pub fn load(&self, kind: MeasurementKind) -> Result<Snapshot> {
        read_snapshot(&self.path_for(kind))
    }

    /// Every snapshot in the directory, ordered by kind.
    pub fn list(&self) -> Result<Vec<SnapshotSummary>> {
        let mut out = Vec::new();
        for kind in MeasurementKind::ALL {
            let path = self.path_for(kind);
            if !path.exists() {
                continue;
            }
            match read_snapshot(&path) {
                Ok(s) => out.push(SnapshotSummary {
                    path,
                    kind: s.kind,
                    written_at: s.written_at,
                    readings: s.readings.len(),
                }),
                Err(e) => {
                    log::warn!("skipping unreadable snapshot {}: {e}", path.display())
                }
            }
        }
        Ok(out)
    }
}

impl SnapshotSink for SnapshotWriter {
    fn persist(&self, kind: MeasurementKind, batch: &[Reading]) -> Result<()> {
        let path = self.write(kind, batch)?;
        log::debug!(
            "wrote {} {kind} readings to {}",
            batch.len(),
            path.display()
        );
        Ok(())
    }
}

/// Read a snapshot file from an arbitrary path.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

// ---------------------------------------------------------------------------
// In-memory sink
// ---------------------------------------------------------------------------

/// Keeps every persisted batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<(MeasurementKind, Vec<Reading>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches persisted so far, in order.
    pub fn batches(&self) -> Vec<(MeasurementKind, Vec<Reading>)> {
        self.batches.lock().unwrap().clone()
    }

    /// Batches persisted for `kind`.
    pub fn batches_for(&self, kind: MeasurementKind) -> Vec<Vec<Reading>> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

impl SnapshotSink for MemorySink {
    fn persist(&self, kind: MeasurementKind, batch: &[Reading]) -> Result<()> {
        self.batches.lock().unwrap().push((kind, batch.to_vec()));
        Ok(())
    }
}
