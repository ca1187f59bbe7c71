//! Snapshot file adapter.
//!
//! - `save`: under the file lock, copy the engine out, then write a JSON array
//!   of records through a temp file in the same directory and rename it over
//!   the target. A failed save leaves the previous file untouched.
//! - `load`: a missing file is not an error; a malformed one is, and leaves
//!   the engine unchanged.
//! - `run_periodic`: save on a fixed tick until cancelled, then save once more.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use metricsd_core::error::{MetricsError, Result};
use metricsd_core::protocol::MetricRecord;

use super::{MemStorage, MetricStore, Snapshot};
use crate::obs::metrics::ServerMetrics;

/// What `SnapshotFile::load` found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file at the path; nothing was changed.
    Missing,
    /// File parsed and merged into the engine.
    Loaded { gauges: usize, counters: usize },
}

/// Snapshot file bound to one path.
///
/// The internal mutex serializes the periodic saver with explicit
/// save/load calls on the same file, so saves commit in snapshot order.
/// The engine lock is only taken briefly inside it and never the other
/// way round.
#[derive(Debug)]
pub struct SnapshotFile {
    path: PathBuf,
    io_lock: Mutex<()>,
}

fn persistence(path: &Path, op: &str, e: impl std::fmt::Display) -> MetricsError {
    MetricsError::Persistence(format!("{op} {} failed: {e}", path.display()))
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current contents of `store`. Returns the number of records.
    pub fn save(&self, store: &dyn MetricStore) -> Result<usize> {
        let _io = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let records = store.snapshot().to_records();
        let data = serde_json::to_vec_pretty(&records)
            .map_err(|e| persistence(&self.path, "encode", e))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| persistence(&self.path, "create temp for", e))?;
        tmp.write_all(&data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| persistence(&self.path, "write", e))?;
        tmp.persist(&self.path)
            .map_err(|e| persistence(&self.path, "replace", e.error))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "snapshot saved");
        Ok(records.len())
    }

    /// Merge the file into `store`, overwriting loaded names with absolute values.
    pub fn load(&self, store: &MemStorage) -> Result<LoadOutcome> {
        let _io = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let data = match fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(e) => return Err(persistence(&self.path, "read", e)),
        };
        let records: Vec<MetricRecord> =
            serde_json::from_slice(&data).map_err(|e| persistence(&self.path, "parse", e))?;
        let snap =
            Snapshot::from_records(&records).map_err(|e| persistence(&self.path, "parse", e))?;

        let outcome = LoadOutcome::Loaded {
            gauges: snap.gauges.len(),
            counters: snap.counters.len(),
        };
        store.restore(snap);
        Ok(outcome)
    }

    /// Save every `interval` until `cancel` fires, then save a final time.
    ///
    /// Individual failures are logged and retried on the next tick.
    pub async fn run_periodic(
        self: Arc<Self>,
        store: Arc<dyn MetricStore>,
        interval: Duration,
        cancel: CancellationToken,
        metrics: Arc<ServerMetrics>,
    ) {
        tracing::info!(
            path = %self.path.display(),
            interval_secs = interval.as_secs(),
            "snapshot saver started"
        );

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.save_logged(&store, &metrics).await;
                }
                _ = cancel.cancelled() => {
                    tracing::info!("snapshot saver shutting down");
                    self.save_logged(&store, &metrics).await;
                    break;
                }
            }
        }
    }

    async fn save_logged(self: &Arc<Self>, store: &Arc<dyn MetricStore>, metrics: &ServerMetrics) {
        let file = Arc::clone(self);
        let store = Arc::clone(store);
        let res = tokio::task::spawn_blocking(move || file.save(store.as_ref()))
            .await
            .map_err(|e| MetricsError::Internal(format!("snapshot task failed: {e}")))
            .and_then(|r| r);

        match res {
            Ok(_) => metrics.snapshot_saves.inc(&[("result", "ok")]),
            Err(e) => {
                metrics.snapshot_saves.inc(&[("result", "error")]);
                tracing::warn!(error = %e, "periodic snapshot save failed");
            }
        }
    }
}
