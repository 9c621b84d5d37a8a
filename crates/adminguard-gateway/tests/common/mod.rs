#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderName;
use tokio::sync::mpsc;

use adminguard_core::error::{AdminGuardError, Result};
use adminguard_core::license::License;
use adminguard_core::principal::Principal;
use adminguard_core::resource::AllowedIpRanges;
use adminguard_gateway::app_state::{AppParts, AppState};
use adminguard_gateway::audit::MemoryAuditSink;
use adminguard_gateway::context::Caller;
use adminguard_gateway::notify::{NotificationJob, NotificationQueue};
use adminguard_gateway::obs::metrics::GatewayMetrics;
use adminguard_gateway::policy::RolePermissions;
use adminguard_gateway::providers::{
    IpFilterStore, MemoryFeatureFlags, MemoryIpFilterStore, MemoryOAuthConnectionStore,
    MemorySessions, StaticLicense,
};

pub const ADMIN: &str = "admin-1";
pub const VIEWER: &str = "viewer-1";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Counts calls and delegates to an in-memory store, or fails every call.
#[derive(Default)]
pub struct CountingIpStore {
    inner: MemoryIpFilterStore,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingIpStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpFilterStore for CountingIpStore {
    async fn get_filters(&self) -> Result<AllowedIpRanges> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AdminGuardError::Internal("store offline".into()));
        }
        self.inner.get_filters().await
    }

    async fn apply_filters(&self, ranges: AllowedIpRanges) -> Result<AllowedIpRanges> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AdminGuardError::Internal("store offline".into()));
        }
        self.inner.apply_filters(ranges).await
    }
}

pub struct Harness {
    pub app: AppState,
    pub license: Arc<StaticLicense>,
    pub flags: Arc<MemoryFeatureFlags>,
    pub ip_store: Arc<CountingIpStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub jobs: mpsc::Receiver<NotificationJob>,
    pub metrics: Arc<GatewayMetrics>,
}

pub struct HarnessBuilder {
    license: Option<License>,
    flags: Vec<(&'static str, bool)>,
    ip_store: CountingIpStore,
    queue_capacity: usize,
}

impl HarnessBuilder {
    pub fn license(mut self, license: Option<License>) -> Self {
        self.license = license;
        self
    }

    pub fn flag(mut self, flag: &'static str, on: bool) -> Self {
        self.flags.push((flag, on));
        self
    }

    pub fn ip_store(mut self, store: CountingIpStore) -> Self {
        self.ip_store = store;
        self
    }

    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    pub fn build(self) -> Harness {
        let metrics = Arc::new(GatewayMetrics::default());
        let license = Arc::new(StaticLicense::new(self.license));
        let flags = Arc::new(MemoryFeatureFlags::default());
        for (f, on) in self.flags {
            flags.set(f, on);
        }
        let ip_store = Arc::new(self.ip_store);
        let audit = Arc::new(MemoryAuditSink::new());
        let (queue, jobs) = NotificationQueue::bounded(self.queue_capacity, Arc::clone(&metrics));

        let mut roles = BTreeMap::new();
        roles.insert("system_admin".to_string(), vec!["*".to_string()]);
        roles.insert(
            "system_read_only_admin".to_string(),
            vec!["sysconsole_read_ip_filters".to_string()],
        );

        let sessions = MemorySessions::default();
        sessions.insert(ADMIN_TOKEN, admin().principal);

        let app = AppState::from_parts(AppParts {
            license: license.clone(),
            flags: flags.clone(),
            permissions: Arc::new(RolePermissions::new(&roles).unwrap()),
            sessions: Arc::new(sessions),
            ip_filters: ip_store.clone(),
            oauth_connections: Arc::new(MemoryOAuthConnectionStore::default()),
            audit_sink: audit.clone(),
            notifications: queue,
            metrics: Arc::clone(&metrics),
            trusted_proxy_headers: vec![HeaderName::from_static("x-forwarded-for")],
        });

        Harness {
            app,
            license,
            flags,
            ip_store,
            audit,
            jobs,
            metrics,
        }
    }
}

/// Enterprise license, both feature flags on.
pub fn harness() -> HarnessBuilder {
    HarnessBuilder {
        license: Some(License::enterprise()),
        flags: vec![("CloudIPFiltering", true), ("OutgoingOAuthConnections", true)],
        ip_store: CountingIpStore::default(),
        queue_capacity: 16,
    }
}

pub fn admin() -> Caller {
    Caller::new(Principal::new(ADMIN, vec!["system_admin".into()]), "10.0.0.7")
}

pub fn viewer() -> Caller {
    Caller::new(
        Principal::new(VIEWER, vec!["system_read_only_admin".into()]),
        "10.0.0.8",
    )
}

pub fn nobody() -> Caller {
    Caller::new(Principal::new("user-9", vec![]), "10.0.0.9")
}

impl Harness {
    pub fn drain_jobs(&mut self) -> Vec<NotificationJob> {
        let mut out = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            out.push(job);
        }
        out
    }
}
