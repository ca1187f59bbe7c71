//! Update pipeline: the seam between the transport and the storage engine.
//!
//! Every write goes store-first, audit-second. The audit step is dispatched
//! in the background and its outcome never reaches the caller.
//!
//! Batches prefer the store's atomic `BatchUpdate` capability. Stores without
//! it get the per-item fallback, which is NOT atomic: it applies entries one
//! by one and stops at the first invalid entry, leaving earlier entries
//! applied and skipping the audit event.

use std::sync::Arc;

use metricsd_core::error::{MetricsError, Result};
use metricsd_core::protocol::{MetricKind, MetricRecord, MetricUpdate};

use crate::audit::Auditor;
use crate::obs::metrics::ServerMetrics;
use crate::storage::{BatchOutcome, MetricStore, Snapshot};

pub struct UpdatePipeline {
    store: Arc<dyn MetricStore>,
    auditor: Arc<Auditor>,
    metrics: Arc<ServerMetrics>,
}

impl UpdatePipeline {
    pub fn new(
        store: Arc<dyn MetricStore>,
        auditor: Arc<Auditor>,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            store,
            auditor,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<dyn MetricStore> {
        &self.store
    }

    /// Apply one record and audit it. Returns the stored state of that metric.
    pub fn update_one(&self, rec: &MetricRecord, client_ip: &str) -> Result<MetricRecord> {
        let update = rec.to_update().map_err(|e| self.reject(e))?;
        let stored = self.apply(&update);
        self.audit(vec![update.name().to_string()], client_ip);
        Ok(stored)
    }

    /// Apply a batch and audit every applied name in one event.
    pub fn update_batch(&self, batch: &[MetricRecord], client_ip: &str) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Err(self.reject(MetricsError::BadRequest("empty batch".into())));
        }

        let outcome = match self.store.as_batch() {
            Some(b) => {
                let outcome = b.apply_batch(batch).map_err(|e| self.reject(e))?;
                for rec in batch.iter().filter(|r| r.to_update().is_ok()) {
                    self.metrics.updates.inc(&[("kind", rec.kind.as_str())]);
                }
                outcome
            }
            None => self.apply_each(batch)?,
        };

        if outcome.skipped > 0 {
            tracing::debug!(
                applied = outcome.applied.len(),
                skipped = outcome.skipped,
                "batch applied with skipped entries"
            );
        }
        if !outcome.applied.is_empty() {
            self.audit(outcome.applied.clone(), client_ip);
        }
        Ok(outcome)
    }

    /// Point read. `None` if the name was never written as `kind`.
    pub fn read_one(&self, name: &str, kind: MetricKind) -> Option<MetricRecord> {
        match kind {
            MetricKind::Gauge => self.store.gauge(name).map(|v| MetricRecord::gauge(name, v)),
            MetricKind::Counter => self.store.counter(name).map(|d| MetricRecord::counter(name, d)),
        }
    }

    /// Point read from a `{id, type}` request record.
    pub fn read_record(&self, rec: &MetricRecord) -> Result<MetricRecord> {
        let kind = rec.metric_kind()?;
        self.read_one(&rec.id, kind).ok_or(MetricsError::NotFound)
    }

    pub fn read_all(&self) -> Snapshot {
        self.store.snapshot()
    }

    fn apply(&self, update: &MetricUpdate) -> MetricRecord {
        self.metrics.updates.inc(&[("kind", update.kind().as_str())]);
        match update {
            MetricUpdate::Gauge { name, value } => {
                self.store.set_gauge(name, *value);
                MetricRecord::gauge(name.clone(), *value)
            }
            MetricUpdate::Counter { name, delta } => {
                let total = self.store.add_counter(name, *delta);
                MetricRecord::counter(name.clone(), total)
            }
        }
    }

    fn apply_each(&self, batch: &[MetricRecord]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for rec in batch {
            let update = rec.to_update().map_err(|e| {
                tracing::warn!(
                    id = %rec.id,
                    applied = outcome.applied.len(),
                    error = %e,
                    "per-item batch stopped at invalid entry"
                );
                self.reject(e)
            })?;
            self.apply(&update);
            outcome.applied.push(update.name().to_string());
        }
        Ok(outcome)
    }

    fn audit(&self, names: Vec<String>, client_ip: &str) {
        let _ = self.auditor.dispatch(names, client_ip.to_string());
    }

    fn reject(&self, e: MetricsError) -> MetricsError {
        self.metrics
            .update_errors
            .inc(&[("code", e.client_code().as_str())]);
        e
    }
}
