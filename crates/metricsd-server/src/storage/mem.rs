use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metricsd_core::error::Result;
use metricsd_core::protocol::{MetricRecord, MetricUpdate};

use super::{BatchOutcome, BatchUpdate, MetricStore, Snapshot};

#[derive(Debug, Default)]
struct Maps {
    gauges: HashMap<String, f64>,
    counters: HashMap<String, i64>,
}

impl Maps {
    fn add_counter(&mut self, name: String, delta: i64) -> i64 {
        let slot = self.counters.entry(name).or_insert(0);
        *slot = slot.saturating_add(delta);
        *slot
    }

    fn apply(&mut self, update: MetricUpdate) {
        match update {
            MetricUpdate::Gauge { name, value } => {
                self.gauges.insert(name, value);
            }
            MetricUpdate::Counter { name, delta } => {
                self.add_counter(name, delta);
            }
        }
    }
}

/// In-memory metric engine.
///
/// One `RwLock` guards both maps. Writers (point writes, batches, restore)
/// take it exclusively; point reads and snapshots share it. No I/O happens
/// while the lock is held.
#[derive(Debug, Default)]
pub struct MemStorage {
    maps: RwLock<Maps>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // A writer that panicked mid-update can only have left a fully applied
    // single-map insert behind, so the data is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        self.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Maps> {
        self.maps.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite stored values with `snap` (absolute, counters are not added).
    /// Names absent from `snap` are left alone.
    pub fn restore(&self, snap: Snapshot) {
        let mut maps = self.write();
        maps.gauges.extend(snap.gauges);
        maps.counters.extend(snap.counters);
    }

    /// Number of stored (gauges, counters).
    pub fn len(&self) -> (usize, usize) {
        let maps = self.read();
        (maps.gauges.len(), maps.counters.len())
    }
}

impl MetricStore for MemStorage {
    fn set_gauge(&self, name: &str, value: f64) {
        self.write().gauges.insert(name.to_string(), value);
    }

    fn add_counter(&self, name: &str, delta: i64) -> i64 {
        self.write().add_counter(name.to_string(), delta)
    }

    fn gauge(&self, name: &str) -> Option<f64> {
        self.read().gauges.get(name).copied()
    }

    fn counter(&self, name: &str) -> Option<i64> {
        self.read().counters.get(name).copied()
    }

    fn snapshot(&self) -> Snapshot {
        let maps = self.read();
        Snapshot {
            gauges: maps.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            counters: maps.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }

    fn as_batch(&self) -> Option<&dyn BatchUpdate> {
        Some(self)
    }
}

impl BatchUpdate for MemStorage {
    fn apply_batch(&self, batch: &[MetricRecord]) -> Result<BatchOutcome> {
        // Validate outside the lock; only the inserts run inside it.
        let mut outcome = BatchOutcome::default();
        let mut updates = Vec::with_capacity(batch.len());
        for rec in batch {
            match rec.to_update() {
                Ok(u) => updates.push(u),
                Err(e) => {
                    tracing::debug!(
                        id = %rec.id,
                        kind = %rec.kind,
                        error = %e,
                        "batch entry skipped"
                    );
                    outcome.skipped += 1;
                }
            }
        }

        outcome.applied = updates.iter().map(|u| u.name().to_string()).collect();

        let mut maps = self.write();
        for u in updates {
            maps.apply(u);
        }
        Ok(outcome)
    }
}
