use std::time::Duration;

use async_trait::async_trait;

use metricsd_core::error::{MetricsError, Result};
use metricsd_core::protocol::AuditEvent;

use super::AuditSink;

/// POSTs each event as a JSON body.
///
/// Anything other than a 2xx/3xx status counts as a failed delivery.
pub struct HttpSink {
    url: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::Internal(format!("audit http client build failed: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AuditSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, ev: &AuditEvent) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(ev)
            .send()
            .await
            .map_err(|e| MetricsError::Internal(format!("audit post failed: {e}")))?;

        let status = resp.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(MetricsError::Internal(format!("audit sink HTTP status {status}")))
        }
    }
}
