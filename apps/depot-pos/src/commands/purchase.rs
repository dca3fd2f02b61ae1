//! # Supplier and Purchase Commands

use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::Supplier;
use depot_db::{NewSupplier, PurchaseDetail, PurchaseLineRequest};

pub async fn create_supplier(state: &AppState, input: &NewSupplier) -> Result<Supplier, ApiError> {
    Ok(state.db.suppliers().create(input).await?)
}

pub async fn list_suppliers(state: &AppState) -> Result<Vec<Supplier>, ApiError> {
    Ok(state.db.suppliers().list().await?)
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecordPurchaseRequest {
    pub supplier_id: String,
    pub lines: Vec<PurchaseLineRequest>,
}

/// Stock goes up and each product takes the purchase's unit cost.
pub async fn record_purchase(
    state: &AppState,
    request: &RecordPurchaseRequest,
) -> Result<PurchaseDetail, ApiError> {
    let detail = state
        .db
        .purchases()
        .record(&request.supplier_id, &request.lines)
        .await?;

    info!(
        id = %detail.purchase.id,
        total_cents = detail.purchase.total_cents,
        "record_purchase command"
    );
    Ok(detail)
}

pub async fn get_purchase(state: &AppState, id: &str) -> Result<PurchaseDetail, ApiError> {
    state
        .db
        .purchases()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Purchase", id))
}

pub async fn list_purchases(state: &AppState) -> Result<Vec<PurchaseDetail>, ApiError> {
    Ok(state.db.purchases().list().await?)
}
