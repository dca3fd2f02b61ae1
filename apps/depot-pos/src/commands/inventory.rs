//! # Inventory Commands

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::InventoryMovement;
use depot_db::MovementView;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntryRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntryResponse {
    pub movement_id: String,
    pub new_stock: i64,
}

/// Goods received outside a purchase.
pub async fn record_entry(
    state: &AppState,
    request: &RecordEntryRequest,
) -> Result<RecordEntryResponse, ApiError> {
    let movement = state
        .db
        .inventory()
        .record_entry(&request.product_id, request.quantity, request.note.as_deref())
        .await?;

    info!(product_id = %request.product_id, stock = movement.stock_after, "record_entry command");
    Ok(RecordEntryResponse {
        movement_id: movement.id,
        new_stock: movement.stock_after,
    })
}

pub async fn product_history(
    state: &AppState,
    product_id: &str,
) -> Result<Vec<InventoryMovement>, ApiError> {
    Ok(state.db.inventory().history(product_id).await?)
}

/// `limit` defaults to 50, capped at 500.
pub async fn recent_movements(
    state: &AppState,
    limit: Option<u32>,
) -> Result<Vec<MovementView>, ApiError> {
    let limit = limit.unwrap_or(50).min(500);
    Ok(state.db.inventory().recent(limit).await?)
}
