//! Metric record (JSON) and validated write intents.
//!
//! `type` stays a raw string on the wire so that one bad entry in a batch is
//! reported on its own instead of failing the whole document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Metric kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Last-write-wins `f64`.
    Gauge,
    /// Additive `i64`.
    Counter,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauge" => Ok(MetricKind::Gauge),
            "counter" => Ok(MetricKind::Counter),
            other => Err(MetricsError::InvalidKind(other.to_string())),
        }
    }
}

/// Wire and snapshot-file record.
///
/// Gauges carry `value`, counters carry `delta`. The same shape is used for
/// read requests, where both numeric fields are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl MetricRecord {
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Gauge.as_str().to_string(),
            value: Some(value),
            delta: None,
        }
    }

    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            kind: MetricKind::Counter.as_str().to_string(),
            value: None,
            delta: Some(delta),
        }
    }

    /// Parse the `type` field.
    pub fn metric_kind(&self) -> Result<MetricKind> {
        self.kind.parse()
    }

    /// Validate the record as a write intent.
    pub fn to_update(&self) -> Result<MetricUpdate> {
        if self.id.is_empty() {
            return Err(MetricsError::MissingField("id".into()));
        }
        match self.metric_kind()? {
            MetricKind::Gauge => {
                let value = self.value.ok_or_else(|| {
                    MetricsError::MissingField(format!("value (gauge {})", self.id))
                })?;
                Ok(MetricUpdate::Gauge {
                    name: self.id.clone(),
                    value,
                })
            }
            MetricKind::Counter => {
                let delta = self.delta.ok_or_else(|| {
                    MetricsError::MissingField(format!("delta (counter {})", self.id))
                })?;
                Ok(MetricUpdate::Counter {
                    name: self.id.clone(),
                    delta,
                })
            }
        }
    }
}

/// A validated write intent.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricUpdate {
    Gauge { name: String, value: f64 },
    Counter { name: String, delta: i64 },
}

impl MetricUpdate {
    pub fn name(&self) -> &str {
        match self {
            MetricUpdate::Gauge { name, .. } | MetricUpdate::Counter { name, .. } => name,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricUpdate::Gauge { .. } => MetricKind::Gauge,
            MetricUpdate::Counter { .. } => MetricKind::Counter,
        }
    }
}

/// Parse a path-form update (`kind`, `name`, textual number).
pub fn parse_text_update(kind: &str, name: &str, raw: &str) -> Result<MetricUpdate> {
    let kind: MetricKind = kind.parse()?;
    if name.is_empty() {
        return Err(MetricsError::MissingField("id".into()));
    }
    let raw = raw.trim();
    match kind {
        MetricKind::Gauge => {
            let value: f64 = raw.parse().map_err(|_| MetricsError::InvalidValue {
                kind: kind.as_str(),
                raw: raw.to_string(),
            })?;
            if !value.is_finite() {
                return Err(MetricsError::InvalidValue {
                    kind: kind.as_str(),
                    raw: raw.to_string(),
                });
            }
            Ok(MetricUpdate::Gauge {
                name: name.to_string(),
                value,
            })
        }
        MetricKind::Counter => {
            let delta: i64 = raw.parse().map_err(|_| MetricsError::InvalidValue {
                kind: kind.as_str(),
                raw: raw.to_string(),
            })?;
            Ok(MetricUpdate::Counter {
                name: name.to_string(),
                delta,
            })
        }
    }
}

impl From<&MetricUpdate> for MetricRecord {
    fn from(u: &MetricUpdate) -> Self {
        match u {
            MetricUpdate::Gauge { name, value } => MetricRecord::gauge(name.clone(), *value),
            MetricUpdate::Counter { name, delta } => MetricRecord::counter(name.clone(), *delta),
        }
    }
}
