//! # Product Commands
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search_products("7401000000011")                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Looks like a barcode? (8-13 digits)      │                         │
//! │  │  YES: exact barcode lookup first          │──► active? return [1]   │
//! │  │  NO:  name fragment over active products  │                         │
//! │  └───────────────────────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::Product;
use depot_db::{NewProduct, ProductUpdate};

/// Scanners type the whole code in one burst; treat 8-13 digits as a barcode.
fn is_barcode_query(query: &str) -> bool {
    let len = query.len();
    (8..=13).contains(&len) && query.chars().all(|c| c.is_ascii_digit())
}

/// Sale-facing search: active products only.
///
/// `limit` defaults to 20, capped at 100.
pub async fn search_products(
    state: &AppState,
    query: &str,
    limit: Option<u32>,
) -> Result<Vec<Product>, ApiError> {
    let start = Instant::now();
    let query = query.trim();
    let limit = limit.unwrap_or(20).min(100);

    debug!(query = %query, limit, "search_products command");

    if is_barcode_query(query) {
        if let Some(product) = state.db.products().get_by_barcode(query).await? {
            if product.is_active() {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Barcode hit");
                return Ok(vec![product]);
            }
        }
    }

    let products = state.db.products().list_for_sale(query, limit).await?;
    debug!(
        results = products.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "search_products done"
    );
    Ok(products)
}

/// Administrative listing, inactive products included.
pub async fn list_all_products(state: &AppState) -> Result<Vec<Product>, ApiError> {
    Ok(state.db.products().list_all().await?)
}

pub async fn get_product(state: &AppState, id: &str) -> Result<Product, ApiError> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn create_product(state: &AppState, input: &NewProduct) -> Result<Product, ApiError> {
    let product = state.db.products().create(input).await?;
    info!(id = %product.id, "create_product command");
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    id: &str,
    input: &ProductUpdate,
) -> Result<Product, ApiError> {
    Ok(state.db.products().update(id, input).await?)
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockCountRequest {
    pub product_id: String,
    /// Physically counted units.
    pub count: i64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Sets stock to a physical count (adjustment movement).
pub async fn set_product_stock(
    state: &AppState,
    request: &StockCountRequest,
) -> Result<Product, ApiError> {
    Ok(state
        .db
        .products()
        .set_stock(&request.product_id, request.count, request.note.as_deref())
        .await?)
}

pub async fn deactivate_product(state: &AppState, id: &str) -> Result<Product, ApiError> {
    Ok(state.db.products().deactivate(id).await?)
}

pub async fn reactivate_product(state: &AppState, id: &str) -> Result<Product, ApiError> {
    Ok(state.db.products().reactivate(id).await?)
}
