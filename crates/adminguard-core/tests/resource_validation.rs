#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use adminguard_core::error::ClientCode;
use adminguard_core::resource::{
    decode_json, AllowedIpRanges, CreateOAuthConnection, GrantType, ListFilter,
    OutgoingOAuthConnection, UpdateOAuthConnection,
};

#[test]
fn empty_range_list_is_valid() {
    let ranges: AllowedIpRanges = decode_json(b"[]").unwrap();
    assert!(ranges.is_empty());
}

#[test]
fn one_bad_entry_rejects_the_batch() {
    let body = br#"[
        {"cidr_block": "10.0.0.0/8", "description": "a", "enabled": true},
        {"cidr_block": "10.0.0.0/40", "description": "b", "enabled": true}
    ]"#;
    let err = decode_json::<AllowedIpRanges>(body).unwrap_err();
    assert_eq!(err.client_code(), ClientCode::BadRequest);
    assert!(err.to_string().contains("entry 1"));
}

#[test]
fn malformed_json_is_bad_request() {
    let bodies: [&[u8]; 4] = [b"{", b"null", br#"{"cidr_block":"1.2.3.4/32"}"#, b""];
    for body in bodies {
        let err = decode_json::<AllowedIpRanges>(body).unwrap_err();
        assert_eq!(err.client_code(), ClientCode::BadRequest);
    }
}

#[test]
fn unknown_range_fields_are_rejected() {
    let body = br#"[{"cidr_block": "10.0.0.0/8", "cidr": "typo"}]"#;
    assert!(decode_json::<AllowedIpRanges>(body).is_err());
}

const CONN: &str = r#"{
    "name": "crm",
    "client_id": "cid",
    "client_secret": "secret",
    "oauth_token_url": "https://auth.example.com/token",
    "grant_type": "client_credentials",
    "audiences": ["https://api.example.com"]
}"#;

#[test]
fn create_requires_secret_but_update_does_not() {
    let no_secret = CONN.replace("\"client_secret\": \"secret\",", "");
    assert!(decode_json::<CreateOAuthConnection>(CONN.as_bytes()).is_ok());
    assert!(decode_json::<CreateOAuthConnection>(no_secret.as_bytes()).is_err());
    assert!(decode_json::<UpdateOAuthConnection>(no_secret.as_bytes()).is_ok());
}

#[test]
fn password_grant_needs_credentials() {
    let pw = CONN.replace("client_credentials", "password");
    assert!(decode_json::<CreateOAuthConnection>(pw.as_bytes()).is_err());

    let with_creds = pw.replace(
        "\"audiences\"",
        "\"credentials_username\": \"bot\", \"credentials_password\": \"pw\", \"audiences\"",
    );
    assert!(decode_json::<CreateOAuthConnection>(with_creds.as_bytes()).is_ok());
}

fn stored(body: &str) -> OutgoingOAuthConnection {
    let CreateOAuthConnection(input) = decode_json(body.as_bytes()).unwrap();
    OutgoingOAuthConnection::from_input("c1".into(), "u1".into(), 1, input)
}

#[test]
fn update_to_password_grant_needs_a_password() {
    let mut conn = stored(CONN);
    let before = conn.clone();

    let switch = CONN
        .replace("client_credentials", "password")
        .replace("\"client_secret\": \"secret\",", "")
        .replace("\"audiences\"", "\"credentials_username\": \"bob\", \"audiences\"");
    let UpdateOAuthConnection(input) = decode_json(switch.as_bytes()).unwrap();

    let err = conn.apply_update(input, 2).unwrap_err();
    assert_eq!(err.client_code(), ClientCode::BadRequest);
    assert_eq!(conn, before);
}

#[test]
fn update_away_from_password_grant_drops_credentials() {
    let pw = CONN.replace("client_credentials", "password").replace(
        "\"audiences\"",
        "\"credentials_username\": \"bot\", \"credentials_password\": \"pw\", \"audiences\"",
    );
    let mut conn = stored(&pw);

    // Omitted password keeps the stored one while the grant stays the same.
    let keep = pw.replace("\"credentials_password\": \"pw\", ", "");
    let UpdateOAuthConnection(input) = decode_json(keep.as_bytes()).unwrap();
    conn.apply_update(input, 2).unwrap();
    assert_eq!(conn.credentials_password.as_deref(), Some("pw"));

    let UpdateOAuthConnection(input) = decode_json(CONN.as_bytes()).unwrap();
    conn.apply_update(input, 3).unwrap();
    assert_eq!(conn.grant_type, GrantType::ClientCredentials);
    assert_eq!(conn.credentials_username, None);
    assert_eq!(conn.credentials_password, None);
    assert_eq!(conn.update_at, 3);
}

#[test]
fn urls_must_be_http() {
    let ftp = CONN.replace("https://auth.example.com/token", "ftp://auth.example.com/token");
    assert!(decode_json::<CreateOAuthConnection>(ftp.as_bytes()).is_err());
    let no_aud = CONN.replace("[\"https://api.example.com\"]", "[]");
    assert!(decode_json::<CreateOAuthConnection>(no_aud.as_bytes()).is_err());
}

#[test]
fn list_limit_bounds() {
    assert_eq!(ListFilter::new(None, None).unwrap().limit, 10);
    assert!(ListFilter::new(None, Some(0)).is_err());
    assert!(ListFilter::new(None, Some(101)).is_err());
    assert_eq!(ListFilter::new(Some(String::new()), Some(5)).unwrap().from_id, None);
}
