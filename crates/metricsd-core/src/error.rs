//! Shared error type across metricsd crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientCode {
    /// Metric kind is neither `gauge` nor `counter`.
    InvalidKind,
    /// Numeric value could not be parsed for the declared kind.
    InvalidValue,
    /// A field required by the declared kind is absent.
    MissingField,
    /// Malformed request that is not tied to a single record.
    BadRequest,
    /// Metric not present in the store.
    NotFound,
    /// Storage backend failed to apply a write.
    Storage,
    /// Snapshot file could not be read, parsed, or written.
    Persistence,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in responses, logs, and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidKind => "INVALID_KIND",
            ClientCode::InvalidValue => "INVALID_VALUE",
            ClientCode::MissingField => "MISSING_FIELD",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Storage => "STORAGE",
            ClientCode::Persistence => "PERSISTENCE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// True for errors caused by the caller's input.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ClientCode::InvalidKind
                | ClientCode::InvalidValue
                | ClientCode::MissingField
                | ClientCode::BadRequest
        )
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metric kind: {0}")]
    InvalidKind(String),
    #[error("invalid value for {kind} metric: {raw}")]
    InvalidValue { kind: &'static str, raw: String },
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("metric not found")]
    NotFound,
    #[error("storage: {0}")]
    Storage(String),
    #[error("persistence: {0}")]
    Persistence(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MetricsError::InvalidKind(_) => ClientCode::InvalidKind,
            MetricsError::InvalidValue { .. } => ClientCode::InvalidValue,
            MetricsError::MissingField(_) => ClientCode::MissingField,
            MetricsError::BadRequest(_) => ClientCode::BadRequest,
            MetricsError::NotFound => ClientCode::NotFound,
            MetricsError::Storage(_) => ClientCode::Storage,
            MetricsError::Persistence(_) => ClientCode::Persistence,
            MetricsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            MetricsError::Internal(_) => ClientCode::Internal,
        }
    }
}
