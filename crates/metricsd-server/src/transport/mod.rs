//! HTTP transport adapter.
//!
//! Thin handlers that parse requests, call the update pipeline, and render
//! results. Client IP extraction lives here too, since only the transport
//! knows about proxy headers.

pub mod client_ip;
pub mod error;
pub mod handlers;

pub use client_ip::ClientIp;
pub use error::ApiError;
