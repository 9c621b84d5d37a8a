//! Shared application state.
//!
//! `AppParts` is the injection point: the binary builds it from config via
//! [`AppState::from_config`], tests assemble it from fakes and call
//! [`AppState::from_parts`] directly.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;

use adminguard_core::error::{AdminGuardError, Result};

use crate::audit::{AuditRecorder, AuditSink, FileAuditSink, MemoryAuditSink, TracingAuditSink};
use crate::config::{AuditSinkKind, GatewayConfig};
use crate::notify::{FanOutDeps, NotificationQueue, NotificationWorkers};
use crate::obs::metrics::GatewayMetrics;
use crate::pipeline::Pipeline;
use crate::policy::{Gate, RolePermissions};
use crate::providers::{
    FeatureFlagProvider, IpFilterStore, LicenseProvider, LogSender, MemoryCloudDirectory,
    MemoryFeatureFlags, MemoryIpFilterStore, MemoryOAuthConnectionStore, MemorySessions,
    MemoryUserDirectory, OAuthConnectionStore, PermissionProvider, SessionResolver, StaticLicense,
};

/// Everything the request path depends on.
pub struct AppParts {
    pub license: Arc<dyn LicenseProvider>,
    pub flags: Arc<dyn FeatureFlagProvider>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub sessions: Arc<dyn SessionResolver>,
    pub ip_filters: Arc<dyn IpFilterStore>,
    pub oauth_connections: Arc<dyn OAuthConnectionStore>,
    pub audit_sink: Arc<dyn AuditSink>,
    pub notifications: NotificationQueue,
    pub metrics: Arc<GatewayMetrics>,
    pub trusted_proxy_headers: Vec<HeaderName>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: Pipeline,
    sessions: Arc<dyn SessionResolver>,
    ip_filters: Arc<dyn IpFilterStore>,
    oauth_connections: Arc<dyn OAuthConnectionStore>,
    metrics: Arc<GatewayMetrics>,
    trusted_proxy_headers: Vec<HeaderName>,
    queue_capacity: usize,
}

impl AppState {
    pub fn from_parts(parts: AppParts) -> Self {
        let gate = Gate::new(
            parts.license,
            parts.flags,
            parts.permissions,
            Arc::clone(&parts.metrics),
        );
        let audit = AuditRecorder::new(parts.audit_sink, Arc::clone(&parts.metrics));
        let queue_capacity = parts.notifications.capacity();
        let pipeline = Pipeline::new(gate, audit, parts.notifications);

        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                sessions: parts.sessions,
                ip_filters: parts.ip_filters,
                oauth_connections: parts.oauth_connections,
                metrics: parts.metrics,
                trusted_proxy_headers: parts.trusted_proxy_headers,
                queue_capacity,
            }),
        }
    }

    /// Build in-process providers from config and start the notification workers.
    ///
    /// Must be called inside a tokio runtime. The workers stop once every
    /// clone of the returned state is dropped.
    pub fn from_config(cfg: &GatewayConfig) -> Result<(Self, NotificationWorkers)> {
        let metrics = Arc::new(GatewayMetrics::default());

        let audit_sink: Arc<dyn AuditSink> = match cfg.audit.sink {
            AuditSinkKind::Tracing => Arc::new(TracingAuditSink),
            AuditSinkKind::Memory => Arc::new(MemoryAuditSink::new()),
            AuditSinkKind::File => {
                let path = cfg.audit.path.as_deref().unwrap_or_default();
                let sink = FileAuditSink::open(path).map_err(|e| {
                    AdminGuardError::Internal(format!("open audit file {path} failed: {e}"))
                })?;
                Arc::new(sink)
            }
        };

        let trusted_proxy_headers = cfg
            .gateway
            .trusted_proxy_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes()).map_err(|e| {
                    AdminGuardError::BadRequest(format!("invalid trusted proxy header {h}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (notifications, rx) =
            NotificationQueue::bounded(cfg.notifications.queue_capacity, Arc::clone(&metrics));

        let owner_email = cfg
            .license
            .as_ref()
            .and_then(|l| l.workspace_owner_email.clone());
        let deps = FanOutDeps {
            directory: Arc::new(MemoryUserDirectory::from_users(&cfg.users)),
            cloud: Arc::new(MemoryCloudDirectory::new(owner_email)),
            sender: Arc::new(LogSender),
            site_url: cfg.gateway.site_url.clone(),
            cws_url: cfg.gateway.cws_url.clone(),
            delivery_timeout: Duration::from_millis(cfg.notifications.delivery_timeout_ms),
            metrics: Arc::clone(&metrics),
        };
        let workers = NotificationWorkers::spawn(rx, Arc::new(deps), cfg.notifications.workers);

        let state = Self::from_parts(AppParts {
            license: Arc::new(StaticLicense::new(cfg.license())),
            flags: Arc::new(MemoryFeatureFlags::new(&cfg.feature_flags)),
            permissions: Arc::new(RolePermissions::new(&cfg.roles)?),
            sessions: Arc::new(MemorySessions::from_users(&cfg.users)),
            ip_filters: Arc::new(MemoryIpFilterStore::default()),
            oauth_connections: Arc::new(MemoryOAuthConnectionStore::default()),
            audit_sink,
            notifications,
            metrics,
            trusted_proxy_headers,
        });

        tracing::info!(
            audit_sink = ?cfg.audit.sink,
            workers = cfg.notifications.workers,
            queue_capacity = cfg.notifications.queue_capacity,
            licensed = cfg.license.is_some(),
            "application state ready"
        );
        Ok((state, workers))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    pub fn sessions(&self) -> &dyn SessionResolver {
        self.inner.sessions.as_ref()
    }

    pub fn trusted_proxy_headers(&self) -> &[HeaderName] {
        &self.inner.trusted_proxy_headers
    }

    pub fn ip_filters(&self) -> Arc<dyn IpFilterStore> {
        Arc::clone(&self.inner.ip_filters)
    }

    pub fn oauth_connections(&self) -> Arc<dyn OAuthConnectionStore> {
        Arc::clone(&self.inner.oauth_connections)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    /// Gauges that are not owned by the metrics registry.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![(
            "adminguard_notification_queue_capacity",
            self.inner.queue_capacity as u64,
        )]
    }
}
