//! IP allow-list endpoints.

use axum::extract::State;
use axum::Json;
use bytes::Bytes;

use adminguard_core::audit::AuditLevel;
use adminguard_core::capability::{Capability, Permission};
use adminguard_core::license::SKU_ENTERPRISE;
use adminguard_core::resource::{AllowedIpRanges, CallerAddress};

use super::ApiError;
use crate::app_state::AppState;
use crate::context::Caller;
use crate::notify::NoticeKind;
use crate::pipeline::WriteAction;

pub const FEATURE_FLAG: &str = "CloudIPFiltering";
const SKUS: &[&str] = &[SKU_ENTERPRISE];

pub const GET_IP_FILTERS: Capability = Capability {
    name: "getIPFilters",
    feature_flag: FEATURE_FLAG,
    skus: SKUS,
    permission: Some(Permission::ReadIpFilters),
};

pub const APPLY_IP_FILTERS: Capability = Capability {
    name: "applyIPFilters",
    feature_flag: FEATURE_FLAG,
    skus: SKUS,
    permission: Some(Permission::WriteIpFilters),
};

pub const MY_IP: Capability = Capability {
    name: "myIP",
    feature_flag: FEATURE_FLAG,
    skus: SKUS,
    permission: None,
};

const APPLY: WriteAction = WriteAction {
    capability: &APPLY_IP_FILTERS,
    level: AuditLevel::Content,
    param: "IPFilter",
    notice: NoticeKind::IpFiltersChanged,
};

pub async fn get_filters(
    State(app): State<AppState>,
    caller: Caller,
) -> Result<Json<AllowedIpRanges>, ApiError> {
    let admitted = app.pipeline().admit(&GET_IP_FILTERS, &caller)?;
    let ranges = admitted.read(app.ip_filters().get_filters()).await?;
    Ok(Json(ranges))
}

pub async fn apply_filters(
    State(app): State<AppState>,
    caller: Caller,
    body: Bytes,
) -> Result<Json<AllowedIpRanges>, ApiError> {
    let admitted = app.pipeline().admit(APPLY.capability, &caller)?;
    let ranges: AllowedIpRanges = admitted.decode(&body)?;

    let store = app.ip_filters();
    let updated = admitted
        .commit(APPLY, ranges, |r| async move { store.apply_filters(r).await })
        .await?;
    Ok(Json(updated))
}

pub async fn my_ip(
    State(app): State<AppState>,
    caller: Caller,
) -> Result<Json<CallerAddress>, ApiError> {
    let admitted = app.pipeline().admit(&MY_IP, &caller)?;
    let ip = admitted.caller().client_ip.clone();
    let addr = admitted.read(async { Ok(CallerAddress { ip }) }).await?;
    Ok(Json(addr))
}
