use std::time::Duration;

use metricsd_core::error::{MetricsError, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub audit: AuditSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.storage.validate()?;
        self.audit.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// How long `/readyz` reports draining before the listener closes.
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            drain_grace_ms: default_drain_grace_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.drain_grace_ms > 60000 {
            return Err(MetricsError::BadRequest(
                "server.drain_grace_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default = "default_file_path")]
    pub file_path: String,

    #[serde(default = "default_store_interval_secs")]
    pub store_interval_secs: u64,

    /// Load `file_path` into memory at startup.
    #[serde(default = "default_restore")]
    pub restore: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
            store_interval_secs: default_store_interval_secs(),
            restore: default_restore(),
        }
    }
}

impl StorageSection {
    pub fn validate(&self) -> Result<()> {
        if self.file_path.trim().is_empty() {
            return Err(MetricsError::BadRequest(
                "storage.file_path must not be empty".into(),
            ));
        }
        if !(1..=86400).contains(&self.store_interval_secs) {
            return Err(MetricsError::BadRequest(
                "storage.store_interval_secs must be between 1 and 86400".into(),
            ));
        }
        Ok(())
    }

    pub fn store_interval(&self) -> Duration {
        Duration::from_secs(self.store_interval_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    /// JSON-lines file sink.
    #[serde(default)]
    pub file: Option<String>,

    /// HTTP POST sink.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_audit_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            file: None,
            url: None,
            timeout_ms: default_audit_timeout_ms(),
        }
    }
}

impl AuditSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.timeout_ms) {
            return Err(MetricsError::BadRequest(
                "audit.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(MetricsError::BadRequest(
                    "audit.url must start with http:// or https://".into(),
                ));
            }
        }
        if matches!(&self.file, Some(f) if f.trim().is_empty()) {
            return Err(MetricsError::BadRequest("audit.file must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_drain_grace_ms() -> u64 {
    2000
}
fn default_file_path() -> String {
    "metrics-db.json".into()
}
fn default_store_interval_secs() -> u64 {
    300
}
fn default_restore() -> bool {
    true
}
fn default_audit_timeout_ms() -> u64 {
    5000
}
