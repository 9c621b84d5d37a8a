//! Outgoing OAuth connection endpoints.
//!
//! Every response body is sanitized; secrets only travel inward.

use axum::extract::{Path, Query, State};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use adminguard_core::audit::{AuditLevel, Auditable};
use adminguard_core::capability::{Capability, Permission};
use adminguard_core::error::AdminGuardError;
use adminguard_core::license::SKU_ENTERPRISE;
use adminguard_core::resource::{
    new_id, now_millis, CreateOAuthConnection, ListFilter, OutgoingOAuthConnection,
    UpdateOAuthConnection,
};

use super::ApiError;
use crate::app_state::AppState;
use crate::context::Caller;
use crate::notify::NoticeKind;
use crate::pipeline::WriteAction;

pub const FEATURE_FLAG: &str = "OutgoingOAuthConnections";
const SKUS: &[&str] = &[SKU_ENTERPRISE];

const fn capability(name: &'static str) -> Capability {
    Capability {
        name,
        feature_flag: FEATURE_FLAG,
        skus: SKUS,
        permission: Some(Permission::ManageOutgoingOAuthConnections),
    }
}

pub const LIST_CONNECTIONS: Capability = capability("listOutgoingOAuthConnections");
pub const GET_CONNECTION: Capability = capability("getOutgoingOAuthConnection");
pub const CREATE_CONNECTION: Capability = capability("createOutgoingOAuthConnection");
pub const UPDATE_CONNECTION: Capability = capability("updateOutgoingOAuthConnection");
pub const DELETE_CONNECTION: Capability = capability("deleteOutgoingOAuthConnection");

const fn write(capability: &'static Capability, param: &'static str) -> WriteAction {
    WriteAction {
        capability,
        level: AuditLevel::Api,
        param,
        notice: NoticeKind::OAuthConnectionsChanged,
    }
}

const CREATE: WriteAction = write(&CREATE_CONNECTION, "OutgoingOAuthConnection");
const UPDATE: WriteAction = write(&UPDATE_CONNECTION, "OutgoingOAuthConnection");
const DELETE: WriteAction = write(&DELETE_CONNECTION, "outgoing_oauth_connection_id");

/// Raw query; parsed only after admission so entitlement errors win.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub from_id: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    fn filter(self) -> Result<ListFilter, AdminGuardError> {
        let limit = self
            .limit
            .map(|l| {
                l.parse::<usize>()
                    .map_err(|_| AdminGuardError::BadRequest(format!("invalid limit: {l}")))
            })
            .transpose()?;
        ListFilter::new(self.from_id, limit)
    }
}

pub async fn list_connections(
    State(app): State<AppState>,
    caller: Caller,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<OutgoingOAuthConnection>>, ApiError> {
    let admitted = app.pipeline().admit(&LIST_CONNECTIONS, &caller)?;
    let filter = q.filter()?;
    let conns = admitted.read(app.oauth_connections().list(&filter)).await?;
    Ok(Json(conns.iter().map(OutgoingOAuthConnection::sanitized).collect()))
}

pub async fn get_connection(
    State(app): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<OutgoingOAuthConnection>, ApiError> {
    let admitted = app.pipeline().admit(&GET_CONNECTION, &caller)?;
    let conn = admitted.read(app.oauth_connections().get(&id)).await?;
    Ok(Json(conn.sanitized()))
}

pub async fn create_connection(
    State(app): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<OutgoingOAuthConnection>, ApiError> {
    let admitted = app.pipeline().admit(CREATE.capability, &caller)?;
    let req: CreateOAuthConnection = admitted.decode(&body)?;

    let store = app.oauth_connections();
    let creator = caller.user_id().to_owned();
    let created = admitted
        .commit(CREATE, req, |CreateOAuthConnection(input)| async move {
            let conn = OutgoingOAuthConnection::from_input(new_id(), creator, now_millis(), input);
            store.create(conn).await.map(|c| c.sanitized())
        })
        .await?;
    Ok(Json(created))
}

/// Update payload as recorded in the audit log.
struct ConnectionUpdate {
    id: String,
    req: UpdateOAuthConnection,
}

impl Auditable for ConnectionUpdate {
    fn audit_value(&self) -> Value {
        let mut v = self.req.audit_value();
        if let Value::Object(m) = &mut v {
            m.insert("id".into(), Value::String(self.id.clone()));
        }
        v
    }
}

pub async fn update_connection(
    State(app): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<OutgoingOAuthConnection>, ApiError> {
    let admitted = app.pipeline().admit(UPDATE.capability, &caller)?;
    let req: UpdateOAuthConnection = admitted.decode(&body)?;

    let store = app.oauth_connections();
    let updated = admitted
        .commit(UPDATE, ConnectionUpdate { id, req }, |u| async move {
            store.update(&u.id, u.req.0).await.map(|c| c.sanitized())
        })
        .await?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct StatusOk {
    pub status: &'static str,
}

pub async fn delete_connection(
    State(app): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<StatusOk>, ApiError> {
    let admitted = app.pipeline().admit(DELETE.capability, &caller)?;

    let store = app.oauth_connections();
    admitted
        .commit(DELETE, id, |id| async move {
            store
                .delete(&id)
                .await
                .map(|c| json!({ "deleted": c.sanitized() }))
        })
        .await?;
    Ok(Json(StatusOk { status: "OK" }))
}
