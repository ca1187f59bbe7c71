//! Lightweight in-process self-metrics.
//!
//! Counts what the server itself does (updates accepted, audit deliveries,
//! snapshot saves) and renders it in Prometheus text format for `/metrics`.
//! These are independent of the metrics the server stores for its clients.

pub mod metrics;
