//! metricsd core: transport-agnostic wire records, audit events, and errors.
//!
//! This crate defines the record shapes shared by the storage engine, the
//! snapshot file, the audit sinks, and the HTTP adapter. It carries no
//! runtime or transport dependencies so it can be reused by agents and
//! tooling that only need to speak the wire format.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input always surfaces as `MetricsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{MetricsError, Result};
pub use protocol::{AuditEvent, MetricKind, MetricRecord, MetricUpdate};
