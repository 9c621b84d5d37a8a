//! Axum router wiring.
//!
//! Admin API under `/api/v4`, operational endpoints at the root.

use axum::{routing::get, Router};

use crate::api::{ip_filtering, oauth_connections};
use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v4/ip_filtering",
            get(ip_filtering::get_filters).post(ip_filtering::apply_filters),
        )
        .route("/api/v4/ip_filtering/my_ip", get(ip_filtering::my_ip))
        .route(
            "/api/v4/oauth/outgoing_connections",
            get(oauth_connections::list_connections).post(oauth_connections::create_connection),
        )
        .route(
            "/api/v4/oauth/outgoing_connections/:connection_id",
            get(oauth_connections::get_connection)
                .put(oauth_connections::update_connection)
                .delete(oauth_connections::delete_connection),
        )
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
