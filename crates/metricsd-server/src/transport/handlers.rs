//! Route handlers.
//!
//! - `POST /update/:kind/:name/:value` : single update, path form
//! - `POST /update`                    : single update, JSON record
//! - `POST /updates`                   : batch update, JSON array
//! - `GET  /value/:kind/:name`         : point read, text value
//! - `POST /value`                     : point read, JSON record
//! - `GET  /`                          : every metric as an HTML list

use std::fmt::Write;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use metricsd_core::error::MetricsError;
use metricsd_core::protocol::{parse_text_update, MetricKind, MetricRecord};

use crate::app_state::AppState;
use crate::transport::{ApiError, ClientIp};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 << 20;

pub async fn update_path(
    State(app): State<AppState>,
    ClientIp(ip): ClientIp,
    Path((kind, name, value)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let update = parse_text_update(&kind, &name, &value)?;
    app.pipeline().update_one(&MetricRecord::from(&update), &ip)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "ok",
    )
        .into_response())
}

pub async fn update_json(
    State(app): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(rec): Json<MetricRecord>,
) -> Result<Json<MetricRecord>, ApiError> {
    let stored = app.pipeline().update_one(&rec, &ip)?;
    Ok(Json(stored))
}

pub async fn update_batch(
    State(app): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if let Some(ct) = headers.get(header::CONTENT_TYPE) {
        let ct = ct.to_str().unwrap_or_default();
        if !ct.starts_with("application/json") {
            return Ok((
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json",
            )
                .into_response());
        }
    }

    let batch: Vec<MetricRecord> = serde_json::from_slice(&body)
        .map_err(|e| MetricsError::BadRequest(format!("bad json: {e}")))?;
    let outcome = app.pipeline().update_batch(&batch, &ip)?;

    Ok(Json(json!({
        "status": "ok",
        "applied": outcome.applied.len(),
        "skipped": outcome.skipped,
    }))
    .into_response())
}

pub async fn value_path(
    State(app): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<String, ApiError> {
    let kind: MetricKind = kind.parse()?;
    let rec = app
        .pipeline()
        .read_one(&name, kind)
        .ok_or(MetricsError::NotFound)?;
    Ok(render_value(&rec))
}

pub async fn value_json(
    State(app): State<AppState>,
    Json(req): Json<MetricRecord>,
) -> Result<Json<MetricRecord>, ApiError> {
    Ok(Json(app.pipeline().read_record(&req)?))
}

pub async fn list_all(State(app): State<AppState>) -> Html<String> {
    let snap = app.pipeline().read_all();
    let mut out = String::from("<html><body><h1>Metrics</h1><ul>");
    for (name, v) in &snap.gauges {
        let _ = write!(out, "<li>{}: {}</li>", escape_html(name), v);
    }
    for (name, d) in &snap.counters {
        let _ = write!(out, "<li>{}: {}</li>", escape_html(name), d);
    }
    out.push_str("</ul></body></html>");
    Html(out)
}

fn render_value(rec: &MetricRecord) -> String {
    match (rec.value, rec.delta) {
        (Some(v), _) => v.to_string(),
        (None, Some(d)) => d.to_string(),
        (None, None) => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
