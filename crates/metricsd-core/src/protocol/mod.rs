//! Protocol modules (metric records + audit events).
//!
//! This module hosts the JSON shapes shared by every surface:
//! - Metric records: one named gauge or counter, used on the wire and in the
//!   snapshot file.
//! - Audit events: "these metrics were updated by this client at this time".
//!
//! Validation is panic-free: a malformed record is reported as
//! `MetricsError` and never partially applied.

pub mod audit;
pub mod record;

pub use audit::AuditEvent;
pub use record::{parse_text_update, MetricKind, MetricRecord, MetricUpdate};
