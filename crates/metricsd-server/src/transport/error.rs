use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use metricsd_core::error::{ClientCode, MetricsError};

/// `MetricsError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub MetricsError);

impl From<MetricsError> for ApiError {
    fn from(e: MetricsError) -> Self {
        Self(e)
    }
}

pub fn status_for(code: ClientCode) -> StatusCode {
    if code.is_validation() {
        return StatusCode::BAD_REQUEST;
    }
    match code {
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(code = code.as_str(), error = %self.0, "request failed");
        }
        (status, format!("{}: {}", code.as_str(), self.0)).into_response()
    }
}
