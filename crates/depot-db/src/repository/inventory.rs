//! # Inventory Repository
//!
//! Stock changes and the movement audit trail.
//!
//! ## Conditional Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_movement(tx, product, delta)                                    │
//! │                                                                         │
//! │  UPDATE products SET stock = stock + delta                             │
//! │   WHERE id = ? AND stock + delta >= 0        ◄── single statement,     │
//! │   RETURNING stock                                no read-modify-write  │
//! │       │                                                                 │
//! │       ├── row returned ──► INSERT inventory_movements (stock_after)    │
//! │       │                                                                 │
//! │       └── no row ──► product missing?  → ProductNotFound               │
//! │                      otherwise         → InsufficientStock             │
//! │                      (caller drops the tx: everything rolls back)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::{new_id, Tx};
use depot_core::validation::{validate_optional_text, validate_quantity};
use depot_core::{CoreError, InventoryMovement, MovementKind, Product};

const SELECT_PRODUCT: &str = "SELECT id, name, barcode, cost_cents, price_cents, stock, status, created_at, updated_at FROM products";

// =============================================================================
// Transaction helpers
// =============================================================================

/// Changes a product's stock by `delta` and appends the matching movement.
///
/// `delta` must be non-zero. Fails without writing if the stock would go
/// negative or the product does not exist.
pub async fn apply_movement(
    tx: &mut Tx<'_>,
    product_id: &str,
    delta: i64,
    kind: MovementKind,
    note: Option<&str>,
) -> DbResult<InventoryMovement> {
    let now = Utc::now();

    let stock_after: Option<i64> = sqlx::query_scalar(
        "UPDATE products SET stock = stock + ?1, updated_at = ?2 \
         WHERE id = ?3 AND stock + ?1 >= 0 \
         RETURNING stock",
    )
    .bind(delta)
    .bind(now)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(stock_after) = stock_after else {
        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut **tx)
                .await?;

        return Err(match current {
            Some((name, available)) => CoreError::InsufficientStock {
                product: name,
                available,
                requested: -delta,
            },
            None => CoreError::ProductNotFound(product_id.to_string()),
        }
        .into());
    };

    let movement = InventoryMovement {
        id: new_id(),
        product_id: product_id.to_string(),
        quantity: delta,
        kind,
        stock_after,
        note: note.map(str::to_string),
        created_at: now,
    };

    sqlx::query(
        "INSERT INTO inventory_movements (id, product_id, quantity, kind, stock_after, note, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(movement.quantity)
    .bind(movement.kind)
    .bind(movement.stock_after)
    .bind(&movement.note)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;

    debug!(
        product_id = %product_id,
        delta,
        kind = ?kind,
        stock_after,
        "Stock movement applied"
    );

    Ok(movement)
}

/// Loads the named products inside the transaction. Unknown ids are
/// simply absent from the map.
pub async fn load_products(tx: &mut Tx<'_>, ids: &[&str]) -> DbResult<HashMap<String, Product>> {
    let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
    let mut products = HashMap::with_capacity(ids.len());

    for id in ids {
        if let Some(product) = sqlx::query_as::<_, Product>(&sql)
            .bind(*id)
            .fetch_optional(&mut **tx)
            .await?
        {
            products.insert(product.id.clone(), product);
        }
    }

    Ok(products)
}

// =============================================================================
// Read models
// =============================================================================

/// Movement joined with its product name (store-wide history).
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MovementView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub kind: MovementKind,
    pub stock_after: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Receives goods: stock += quantity with an `entry` movement.
    pub async fn record_entry(
        &self,
        product_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> DbResult<InventoryMovement> {
        validate_quantity(quantity)?;
        let note = validate_optional_text("note", note)?;

        debug!(product_id = %product_id, quantity, "Recording stock entry");

        let mut tx = self.pool.begin().await?;
        let movement =
            apply_movement(&mut tx, product_id, quantity, MovementKind::Entry, note.as_deref()).await?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            quantity,
            stock = movement.stock_after,
            "Stock entry recorded"
        );
        Ok(movement)
    }

    /// Movements of one product, oldest first.
    pub async fn history(&self, product_id: &str) -> DbResult<Vec<InventoryMovement>> {
        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let movements = sqlx::query_as::<_, InventoryMovement>(
            "SELECT id, product_id, quantity, kind, stock_after, note, created_at \
             FROM inventory_movements \
             WHERE product_id = ?1 \
             ORDER BY created_at, rowid",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Most recent movements across all products, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<MovementView>> {
        let movements = sqlx::query_as::<_, MovementView>(
            "SELECT m.id, m.product_id, p.name AS product_name, m.quantity, m.kind, \
                    m.stock_after, m.note, m.created_at \
             FROM inventory_movements m \
             INNER JOIN products p ON p.id = m.product_id \
             ORDER BY m.created_at DESC, m.rowid DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
