//! Audit event payload delivered to sinks.

use serde::{Deserialize, Serialize};

/// One "metrics were updated" record.
///
/// Built once per successful update operation and shared by every sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unix timestamp in seconds.
    pub ts: i64,
    /// Names of the metrics touched by the operation.
    pub metrics: Vec<String>,
    /// Client address as reported by the transport (opaque).
    pub ip_address: String,
}

impl AuditEvent {
    pub fn new(ts: i64, metrics: Vec<String>, ip_address: impl Into<String>) -> Self {
        Self {
            ts,
            metrics,
            ip_address: ip_address.into(),
        }
    }
}
