//! metricsd server: in-memory metric store plus everything around it.
//!
//! `storage` owns the maps and the snapshot file, `audit` fans update events
//! out to sinks, and `pipeline` ties the two together. `transport` and `router`
//! are the HTTP face used by `main.rs`.

pub mod app_state;
pub mod audit;
pub mod config;
pub mod obs;
pub mod ops;
pub mod pipeline;
pub mod router;
pub mod storage;
pub mod transport;
