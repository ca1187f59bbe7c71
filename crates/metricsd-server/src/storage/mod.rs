//! Metric storage: engine traits, the in-memory engine, and the snapshot file.
//!
//! Two capabilities are kept separate:
//! - `MetricStore`: point reads/writes plus a full snapshot.
//! - `BatchUpdate`: atomic application of a whole batch.
//!
//! Callers discover the second one through `MetricStore::as_batch`, so a
//! store that cannot apply batches atomically still plugs into the pipeline.

mod mem;
mod snapshot;

use std::collections::BTreeMap;

use metricsd_core::error::Result;
use metricsd_core::protocol::{MetricRecord, MetricUpdate};

pub use mem::MemStorage;
pub use snapshot::{LoadOutcome, SnapshotFile};

/// Thread-safe point operations over gauges and counters.
pub trait MetricStore: Send + Sync {
    /// Overwrite a gauge.
    fn set_gauge(&self, name: &str, value: f64);
    /// Add `delta` to a counter (absent counters start at 0). Returns the new value.
    fn add_counter(&self, name: &str, delta: i64) -> i64;
    fn gauge(&self, name: &str) -> Option<f64>;
    fn counter(&self, name: &str) -> Option<i64>;
    /// Deep copy of every metric.
    fn snapshot(&self) -> Snapshot;

    /// Batch capability, if this store has one.
    fn as_batch(&self) -> Option<&dyn BatchUpdate> {
        None
    }
}

/// Atomic batch application.
pub trait BatchUpdate: Send + Sync {
    /// Apply every valid entry under one critical section.
    ///
    /// Entries with an unknown kind or a missing numeric field are skipped,
    /// the rest still apply. Readers never observe a subset of the applied
    /// entries.
    fn apply_batch(&self, batch: &[MetricRecord]) -> Result<BatchOutcome>;
}

/// Result of `BatchUpdate::apply_batch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Names of applied entries, in batch order (duplicates kept).
    pub applied: Vec<String>,
    /// Number of skipped invalid entries.
    pub skipped: usize,
}

/// Point-in-time copy of all metrics, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub gauges: BTreeMap<String, f64>,
    pub counters: BTreeMap<String, i64>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.gauges.len() + self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty() && self.counters.is_empty()
    }

    /// Flatten into records: gauges first, then counters, each by name.
    pub fn to_records(&self) -> Vec<MetricRecord> {
        let gauges = self
            .gauges
            .iter()
            .map(|(id, v)| MetricRecord::gauge(id.clone(), *v));
        let counters = self
            .counters
            .iter()
            .map(|(id, d)| MetricRecord::counter(id.clone(), *d));
        gauges.chain(counters).collect()
    }

    /// Rebuild from records, keeping the last value per name.
    ///
    /// Unlike a batch, a record that does not describe a complete gauge or
    /// counter makes the whole list invalid.
    pub fn from_records(records: &[MetricRecord]) -> Result<Self> {
        let mut snap = Snapshot::default();
        for rec in records {
            match rec.to_update()? {
                MetricUpdate::Gauge { name, value } => {
                    snap.gauges.insert(name, value);
                }
                MetricUpdate::Counter { name, delta } => {
                    snap.counters.insert(name, delta);
                }
            }
        }
        Ok(snap)
    }
}
