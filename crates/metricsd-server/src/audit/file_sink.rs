use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use metricsd_core::error::{MetricsError, Result};
use metricsd_core::protocol::AuditEvent;

use super::AuditSink;

/// Appends one JSON line per event.
///
/// The mutex spans open+write so concurrent events never interleave partial
/// lines within this process.
pub struct FileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, op: &str, e: std::io::Error) -> MetricsError {
        MetricsError::Internal(format!("{op} {} failed: {e}", self.path.display()))
    }
}

#[async_trait]
impl AuditSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn send(&self, ev: &AuditEvent) -> Result<()> {
        let mut line = serde_json::to_vec(ev)
            .map_err(|e| MetricsError::Internal(format!("audit encode failed: {e}")))?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error("open", e))?;
        f.write_all(&line).await.map_err(|e| self.io_error("write", e))?;
        f.flush().await.map_err(|e| self.io_error("flush", e))?;
        Ok(())
    }
}
