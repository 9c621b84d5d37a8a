#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use adminguard_core::audit::{AuditError, AuditLevel, AuditRecord, AuditState};
use adminguard_core::resource::{AllowedIpRange, AllowedIpRanges, CreateOAuthConnection, GrantType, OAuthConnectionInput};

fn record() -> AuditRecord {
    AuditRecord::new("r1", "applyIPFilters", "user-1", "10.0.0.1", AuditLevel::Content, 1)
}

#[test]
fn starts_pending_and_finalizes_once() {
    let mut rec = record();
    assert_eq!(rec.state(), AuditState::Pending);

    rec.finalize(AuditState::Success, None, 2).unwrap();
    assert_eq!(rec.state(), AuditState::Success);
    assert_eq!(rec.finalized_at_ms(), Some(2));

    let err = rec.finalize(AuditState::Fail, None, 3).unwrap_err();
    assert_eq!(err, AuditError::AlreadyFinalized(AuditState::Success));
    assert_eq!(rec.state(), AuditState::Success);
}

#[test]
fn pending_is_not_a_terminal_outcome() {
    let mut rec = record();
    assert_eq!(
        rec.finalize(AuditState::Pending, None, 2).unwrap_err(),
        AuditError::PendingOutcome
    );
    assert_eq!(rec.state(), AuditState::Pending);
}

#[test]
fn duplicate_parameter_is_rejected_and_first_value_kept() {
    let mut rec = record();
    rec.add_parameter("IPFilter", "first").unwrap();
    let err = rec.add_parameter("IPFilter", "second").unwrap_err();
    assert_eq!(err, AuditError::DuplicateParameter("IPFilter".into()));
    assert_eq!(rec.parameters().len(), 1);
    assert_eq!(rec.parameter("IPFilter").unwrap(), "first");
}

#[test]
fn parameters_keep_insertion_order() {
    let mut rec = record();
    rec.add_parameter("b", "1").unwrap();
    rec.add_parameter("a", "2").unwrap();
    let keys: Vec<_> = rec.parameters().iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, ["b", "a"]);
}

#[test]
fn no_parameters_after_finalize() {
    let mut rec = record();
    rec.finalize(AuditState::Fail, Some("boom".into()), 2).unwrap();
    assert!(rec.add_parameter("late", "x").is_err());
    assert_eq!(rec.error(), Some("boom"));
}

#[test]
fn ip_ranges_are_recorded_in_full() {
    let mut rec = record();
    let ranges = AllowedIpRanges(vec![AllowedIpRange {
        cidr_block: "10.0.0.0/8".into(),
        description: "office".into(),
        enabled: true,
        owner_id: String::new(),
    }]);
    rec.add_parameter("IPFilter", &ranges).unwrap();
    let v = rec.parameter("IPFilter").unwrap();
    assert_eq!(v[0]["cidr_block"], "10.0.0.0/8");
    assert_eq!(v[0]["enabled"], true);
}

#[test]
fn oauth_secrets_are_redacted() {
    let mut rec = record();
    let input = CreateOAuthConnection(OAuthConnectionInput {
        name: "crm".into(),
        client_id: "cid".into(),
        client_secret: "hunter2".into(),
        credentials_username: None,
        credentials_password: None,
        oauth_token_url: "https://auth.example.com/token".into(),
        grant_type: GrantType::ClientCredentials,
        audiences: vec!["https://api.example.com".into()],
    });
    rec.add_parameter("OutgoingOAuthConnection", &input).unwrap();
    let rendered = serde_json::to_string(&rec).unwrap();
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("\"state\":\"pending\""));
}
