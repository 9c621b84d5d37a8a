use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};

use adminguard_core::error::AdminGuardError;
use adminguard_core::principal::Principal;

use crate::api::ApiError;
use crate::app_state::AppState;

/// Authenticated caller of one request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principal: Principal,
    pub client_ip: String,
}

impl Caller {
    pub fn new(principal: Principal, client_ip: impl Into<String>) -> Self {
        Self {
            principal,
            client_ip: client_ip.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        self.principal.user_id()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AdminGuardError::AuthFailed)?;
        let principal = app.sessions().resolve(token).ok_or(AdminGuardError::AuthFailed)?;

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let ip = client_ip(&parts.headers, app.trusted_proxy_headers(), peer);

        Ok(Caller::new(principal, ip))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let v = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = v.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the caller address: the first value of the first trusted header
/// present, else the TCP peer, else empty.
pub fn client_ip(headers: &HeaderMap, trusted: &[HeaderName], peer: Option<SocketAddr>) -> String {
    for name in trusted {
        let first = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = first {
            return ip.to_owned();
        }
    }
    peer.map(|a| a.ip().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn trusted_header_wins_over_peer() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let trusted = [HeaderName::from_static("x-forwarded-for")];
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        assert_eq!(client_ip(&h, &trusted, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn untrusted_headers_are_ignored() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let peer: SocketAddr = "[::1]:80".parse().unwrap();
        assert_eq!(client_ip(&h, &[], Some(peer)), "::1");
        assert_eq!(client_ip(&h, &[], None), "");
    }

    #[test]
    fn bearer_parsing() {
        let mut h = HeaderMap::new();
        assert_eq!(bearer_token(&h), None);
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&h), Some("abc"));
        h.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&h), None);
    }
}
