//! Shared application state for the metricsd server.
//!
//! - One explicit `MemStorage` instance, handed to every component that needs it.
//! - Audit sinks are built from config at startup; tests can inject their own.
//! - A single shutdown token stops the snapshot saver and in-flight audit deliveries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use metricsd_core::error::Result;

use crate::audit::{AuditSink, Auditor, FileSink, HttpSink};
use crate::config::ServerConfig;
use crate::obs::metrics::ServerMetrics;
use crate::pipeline::UpdatePipeline;
use crate::storage::{LoadOutcome, MemStorage, MetricStore, SnapshotFile};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    store: Arc<MemStorage>,
    snapshot: Arc<SnapshotFile>,
    pipeline: UpdatePipeline,
    metrics: Arc<ServerMetrics>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Build application state with audit sinks taken from `cfg.audit`.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
        if let Some(path) = &cfg.audit.file {
            let sink = FileSink::new(path);
            tracing::info!(path = %sink.path().display(), "audit file sink");
            sinks.push(Arc::new(sink));
        }
        if let Some(url) = &cfg.audit.url {
            let sink = HttpSink::new(url.clone(), cfg.audit.timeout())?;
            tracing::info!(url = sink.url(), "audit http sink");
            sinks.push(Arc::new(sink));
        }
        Ok(Self::with_sinks(cfg, sinks))
    }

    /// Build application state with an explicit sink list.
    pub fn with_sinks(cfg: ServerConfig, sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        let metrics = Arc::new(ServerMetrics::default());
        let shutdown = CancellationToken::new();
        let store = Arc::new(MemStorage::new());
        let snapshot = Arc::new(SnapshotFile::new(&cfg.storage.file_path));

        let auditor = Auditor::new(sinks)
            .with_timeout(cfg.audit.timeout())
            .with_cancel(shutdown.child_token())
            .with_metrics(Arc::clone(&metrics));
        if auditor.enabled() {
            tracing::info!(sinks = auditor.sink_count(), "audit enabled");
        }

        let pipeline = UpdatePipeline::new(
            Arc::clone(&store) as Arc<dyn MetricStore>,
            Arc::new(auditor),
            Arc::clone(&metrics),
        );

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                snapshot,
                pipeline,
                metrics,
                shutdown,
            }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<MemStorage> {
        Arc::clone(&self.inner.store)
    }

    pub fn snapshot_file(&self) -> Arc<SnapshotFile> {
        Arc::clone(&self.inner.snapshot)
    }

    pub fn pipeline(&self) -> &UpdatePipeline {
        &self.inner.pipeline
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Load the snapshot file when `storage.restore` is set.
    ///
    /// A missing file yields `Ok(LoadOutcome::Missing)`; a malformed one is an
    /// error and the caller decides whether to abort.
    pub fn restore(&self) -> Result<Option<LoadOutcome>> {
        if !self.inner.cfg.storage.restore {
            return Ok(None);
        }
        self.inner.snapshot.load(&self.inner.store).map(Some)
    }

    /// Start the periodic snapshot saver; it stops after `stop_background`.
    pub fn spawn_snapshot_saver(&self) -> JoinHandle<()> {
        let file = self.snapshot_file();
        let store = self.store() as Arc<dyn MetricStore>;
        let interval = self.inner.cfg.storage.store_interval();
        let cancel = self.inner.shutdown.child_token();
        let metrics = self.metrics();
        tokio::spawn(file.run_periodic(store, interval, cancel, metrics))
    }

    /// Flip readiness to draining; requests are still served.
    pub fn begin_shutdown(&self) {
        self.inner.metrics.set_draining();
    }

    /// `begin_shutdown`, then keep serving for `grace` so `/readyz` is seen as 503.
    pub async fn drain(&self, grace: Duration) {
        self.begin_shutdown();
        tracing::info!(grace_ms = grace.as_millis() as u64, "draining");
        tokio::time::sleep(grace).await;
    }

    /// Cancel the snapshot saver (which saves once more) and in-flight audit deliveries.
    pub fn stop_background(&self) {
        self.inner.shutdown.cancel();
    }
}
