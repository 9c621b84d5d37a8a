//! Liveness, readiness and metrics endpoints. Unauthenticated and ungated.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::app_state::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> &'static str {
    "ok"
}

/// 503 once shutdown has started so load balancers stop routing here.
pub async fn readyz(State(state): State<AppState>) -> Response {
    let draining = state.is_draining();
    let status = if draining {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = json!({
        "status": if draining { "draining" } else { "ready" },
        "notification_queue_depth": state.metrics().notification_queue_depth.get(&[]),
    });
    (status, Json(body)).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render(&state.metrics_extra());
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
}
