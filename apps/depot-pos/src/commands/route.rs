//! # Route Commands
//!
//! ## Route Lifecycle
//! ```text
//!   create_route ──► stock leaves (route_dispatch)      state: dispatched
//!        │
//!        ▼
//!   record_route_returns ──► stock back by the delta     state: partially_reconciled
//!        │   (absolute quantities; resubmitting the same
//!        │    numbers changes nothing)
//!        ▼
//!   compute_route_value ──► sold = sent - returned, at current prices
//! ```

use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::route::{ReturnEntry, RouteLineRequest, RouteValue};
use depot_core::{RouteHeader, RouteLine};
use depot_db::{RouteDetail, RouteSummary};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    pub header: RouteHeader,
    pub lines: Vec<RouteLineRequest>,
}

pub async fn create_route(
    state: &AppState,
    request: &CreateRouteRequest,
) -> Result<RouteDetail, ApiError> {
    let detail = state.db.routes().create(&request.header, &request.lines).await?;
    info!(id = %detail.route.id, date = %detail.route.date, "create_route command");
    Ok(detail)
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecordReturnsRequest {
    pub route_id: String,
    pub returns: Vec<ReturnEntry>,
}

/// Sets the returned quantity of each listed line. All or nothing.
pub async fn record_route_returns(
    state: &AppState,
    request: &RecordReturnsRequest,
) -> Result<Vec<RouteLine>, ApiError> {
    let lines = state
        .db
        .routes()
        .record_returns(&request.route_id, &request.returns)
        .await?;
    info!(route_id = %request.route_id, entries = request.returns.len(), "record_route_returns command");
    Ok(lines)
}

pub async fn compute_route_value(state: &AppState, route_id: &str) -> Result<RouteValue, ApiError> {
    Ok(state.db.routes().compute_value(route_id).await?)
}

pub async fn get_route(state: &AppState, route_id: &str) -> Result<RouteDetail, ApiError> {
    Ok(state.db.routes().get(route_id).await?)
}

pub async fn list_routes(state: &AppState) -> Result<Vec<RouteSummary>, ApiError> {
    Ok(state.db.routes().list().await?)
}
