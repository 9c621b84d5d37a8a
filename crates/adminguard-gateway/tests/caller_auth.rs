#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;

use adminguard_gateway::context::Caller;

use common::{harness, ADMIN, ADMIN_TOKEN};

async fn extract(req: Request<()>) -> Result<Caller, StatusCode> {
    let h = harness().build();
    let (mut parts, ()) = req.into_parts();
    Caller::from_request_parts(&mut parts, &h.app)
        .await
        .map_err(|e| e.into_response().status())
}

#[tokio::test]
async fn bearer_token_resolves_principal_and_proxy_address() {
    let req = Request::builder()
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
        .body(())
        .unwrap();

    let caller = extract(req).await.unwrap();
    assert_eq!(caller.user_id(), ADMIN);
    assert_eq!(caller.client_ip, "203.0.113.9");
}

#[tokio::test]
async fn peer_address_is_used_without_proxy_header() {
    let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
    let mut req = Request::builder()
        .header("Authorization", format!("bearer {ADMIN_TOKEN}"))
        .body(())
        .unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));

    let caller = extract(req).await.unwrap();
    assert_eq!(caller.client_ip, "192.0.2.4");
}

#[tokio::test]
async fn missing_or_unknown_session_is_unauthorized() {
    let none = Request::builder().body(()).unwrap();
    assert_eq!(extract(none).await.unwrap_err(), StatusCode::UNAUTHORIZED);

    let unknown = Request::builder()
        .header("Authorization", "Bearer nope")
        .body(())
        .unwrap();
    assert_eq!(extract(unknown).await.unwrap_err(), StatusCode::UNAUTHORIZED);

    let basic = Request::builder()
        .header("Authorization", format!("Basic {ADMIN_TOKEN}"))
        .body(())
        .unwrap();
    assert_eq!(extract(basic).await.unwrap_err(), StatusCode::UNAUTHORIZED);
}
