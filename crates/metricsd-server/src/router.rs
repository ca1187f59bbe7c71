//! Axum router wiring.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::transport::handlers::{self, MAX_BODY_BYTES};
use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_all))
        .route("/update", post(handlers::update_json))
        .route("/update/:kind/:name/:value", post(handlers::update_path))
        .route("/updates", post(handlers::update_batch))
        .route("/value", post(handlers::value_json))
        .route("/value/:kind/:name", get(handlers::value_path))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
