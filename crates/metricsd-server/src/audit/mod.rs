//! Best-effort audit fan-out.
//!
//! After a successful write the pipeline hands the updated names to the
//! `Auditor`, which builds one `AuditEvent` and delivers it to every
//! configured sink concurrently. Sink failures are logged and counted, never
//! returned: a broken audit endpoint cannot fail or slow down a metric write
//! beyond the per-sink timeout.

mod file_sink;
mod http_sink;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use metricsd_core::error::Result;
use metricsd_core::protocol::AuditEvent;

use crate::obs::metrics::ServerMetrics;

pub use file_sink::FileSink;
pub use http_sink::HttpSink;

/// Default per-sink delivery bound.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// A delivery target for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Short label for logs and metrics (e.g. `"file"`, `"http"`).
    fn name(&self) -> &str;
    async fn send(&self, ev: &AuditEvent) -> Result<()>;
}

/// Source of audit timestamps.
pub trait Clock: Send + Sync {
    /// Unix seconds.
    fn now_unix(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Per-call delivery tally.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

enum Delivery {
    Ok,
    Failed,
    TimedOut,
    Cancelled,
}

impl Delivery {
    fn label(&self) -> &'static str {
        match self {
            Delivery::Ok => "ok",
            Delivery::Failed => "error",
            Delivery::TimedOut => "timeout",
            Delivery::Cancelled => "cancelled",
        }
    }
}

pub struct Auditor {
    sinks: Vec<Arc<dyn AuditSink>>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    cancel: CancellationToken,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Auditor {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self {
            sinks,
            clock: Arc::new(SystemClock),
            timeout: DEFAULT_DELIVERY_TIMEOUT,
            cancel: CancellationToken::new(),
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cancelling `cancel` aborts in-flight deliveries (not the writes behind them).
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn enabled(&self) -> bool {
        !self.sinks.is_empty()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Build one event and deliver it to every sink, waiting for all of them.
    ///
    /// Returns immediately without touching the clock when no sink is configured.
    pub async fn notify(&self, metrics: Vec<String>, ip: &str) -> DeliveryReport {
        if !self.enabled() {
            return DeliveryReport::default();
        }
        let ev = AuditEvent::new(self.clock.now_unix(), metrics, ip);

        let mut futs = FuturesUnordered::new();
        for sink in &self.sinks {
            let ev = &ev;
            futs.push(async move {
                let outcome = tokio::select! {
                    res = tokio::time::timeout(self.timeout, sink.send(ev)) => match res {
                        Ok(Ok(())) => Delivery::Ok,
                        Ok(Err(e)) => {
                            tracing::warn!(sink = sink.name(), error = %e, "audit delivery failed");
                            Delivery::Failed
                        }
                        Err(_) => {
                            tracing::warn!(
                                sink = sink.name(),
                                timeout_ms = self.timeout.as_millis() as u64,
                                "audit delivery timed out"
                            );
                            Delivery::TimedOut
                        }
                    },
                    _ = self.cancel.cancelled() => Delivery::Cancelled,
                };
                (sink.name().to_string(), outcome)
            });
        }

        let mut report = DeliveryReport::default();
        while let Some((sink, outcome)) = futs.next().await {
            if let Some(m) = &self.metrics {
                m.audit_deliveries
                    .inc(&[("sink", sink.as_str()), ("result", outcome.label())]);
            }
            match outcome {
                Delivery::Ok => report.delivered += 1,
                _ => report.failed += 1,
            }
        }
        report
    }

    /// Fire-and-forget variant of `notify` for the write path.
    ///
    /// Returns `None` (and spawns nothing) when auditing is disabled or when
    /// called outside a tokio runtime; the event is dropped in that case.
    pub fn dispatch(
        self: &Arc<Self>,
        metrics: Vec<String>,
        ip: String,
    ) -> Option<JoinHandle<DeliveryReport>> {
        if !self.enabled() {
            return None;
        }
        let handle = match Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::warn!(metrics = metrics.len(), "no tokio runtime, audit event dropped");
                if let Some(m) = &self.metrics {
                    for sink in &self.sinks {
                        m.audit_deliveries
                            .inc(&[("sink", sink.name()), ("result", "dropped")]);
                    }
                }
                return None;
            }
        };
        let auditor = Arc::clone(self);
        Some(handle.spawn(async move { auditor.notify(metrics, &ip).await }))
    }
}
