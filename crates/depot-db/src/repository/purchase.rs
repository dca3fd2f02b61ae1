//! # Purchase Repository
//!
//! Goods received from a supplier. One purchase is one transaction:
//!
//! ```text
//! record(supplier, lines)
//!   ├── supplier exists?              else SupplierNotFound
//!   ├── INSERT purchases
//!   └── per line
//!         ├── INSERT purchase_lines
//!         ├── apply_movement(+qty, entry)   ProductNotFound rolls back
//!         └── products.cost_cents = unit cost
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::inventory::apply_movement;
use crate::repository::{new_id, Tx};
use depot_core::validation::{
    ensure_unique, validate_line_count, validate_price_cents, validate_quantity,
};
use depot_core::{CoreError, Money, MovementKind, Purchase, PurchaseLine, ValidationError};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLineRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Purchase with its lines.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    pub purchase: Purchase,
    pub lines: Vec<PurchaseLine>,
}

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Records a purchase, raising stock and the products' unit cost.
    pub async fn record(
        &self,
        supplier_id: &str,
        lines: &[PurchaseLineRequest],
    ) -> DbResult<PurchaseDetail> {
        validate_line_count("lines", lines.len())?;
        ensure_unique("productId", lines.iter().map(|l| l.product_id.as_str()))?;
        for line in lines {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "productId".to_string(),
                }
                .into());
            }
            validate_quantity(line.quantity)?;
            validate_price_cents("unitCost", line.unit_cost_cents)?;
        }

        debug!(supplier_id = %supplier_id, lines = lines.len(), "Recording purchase");

        let mut tx = self.pool.begin().await?;

        let supplier: Option<String> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?1")
            .bind(supplier_id)
            .fetch_optional(&mut *tx)
            .await?;
        if supplier.is_none() {
            return Err(CoreError::SupplierNotFound(supplier_id.to_string()).into());
        }

        let now = Utc::now();
        let total: Money = lines
            .iter()
            .map(|l| Money::from_cents(l.unit_cost_cents).multiply_quantity(l.quantity))
            .sum();

        let purchase = Purchase {
            id: new_id(),
            supplier_id: supplier_id.to_string(),
            total_cents: total.cents(),
            created_at: now,
        };

        sqlx::query("INSERT INTO purchases (id, supplier_id, total_cents, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&purchase.id)
            .bind(&purchase.supplier_id)
            .bind(purchase.total_cents)
            .bind(purchase.created_at)
            .execute(&mut *tx)
            .await?;

        let mut saved = Vec::with_capacity(lines.len());
        for line in lines {
            saved.push(insert_line(&mut tx, &purchase.id, line).await?);
        }

        tx.commit().await?;

        info!(
            id = %purchase.id,
            supplier_id = %supplier_id,
            total = %total,
            "Purchase recorded"
        );
        Ok(PurchaseDetail {
            purchase,
            lines: saved,
        })
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PurchaseDetail>> {
        let purchase = sqlx::query_as::<_, Purchase>(
            "SELECT id, supplier_id, total_cents, created_at FROM purchases WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(purchase) = purchase else {
            return Ok(None);
        };
        let lines = self.lines_of(&purchase.id).await?;
        Ok(Some(PurchaseDetail { purchase, lines }))
    }

    /// All purchases, newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseDetail>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            "SELECT id, supplier_id, total_cents, created_at FROM purchases \
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            let lines = self.lines_of(&purchase.id).await?;
            details.push(PurchaseDetail { purchase, lines });
        }
        Ok(details)
    }

    async fn lines_of(&self, purchase_id: &str) -> DbResult<Vec<PurchaseLine>> {
        let lines = sqlx::query_as::<_, PurchaseLine>(
            "SELECT id, purchase_id, product_id, quantity, unit_cost_cents FROM purchase_lines \
             WHERE purchase_id = ?1 ORDER BY rowid",
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}

async fn insert_line(
    tx: &mut Tx<'_>,
    purchase_id: &str,
    line: &PurchaseLineRequest,
) -> DbResult<PurchaseLine> {
    // Movement first: it reports ProductNotFound before the FK would.
    apply_movement(tx, &line.product_id, line.quantity, MovementKind::Entry, Some("purchase")).await?;

    let saved = PurchaseLine {
        id: new_id(),
        purchase_id: purchase_id.to_string(),
        product_id: line.product_id.clone(),
        quantity: line.quantity,
        unit_cost_cents: line.unit_cost_cents,
    };

    sqlx::query(
        "INSERT INTO purchase_lines (id, purchase_id, product_id, quantity, unit_cost_cents) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&saved.id)
    .bind(&saved.purchase_id)
    .bind(&saved.product_id)
    .bind(saved.quantity)
    .bind(saved.unit_cost_cents)
    .execute(&mut **tx)
    .await?;

    sqlx::query("UPDATE products SET cost_cents = ?2 WHERE id = ?1")
        .bind(&line.product_id)
        .bind(line.unit_cost_cents)
        .execute(&mut **tx)
        .await?;

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::supplier::NewSupplier;
    use crate::repository::test_support::{product, stock_of, test_db};
    use crate::{Database, DbError};

    async fn supplier(db: &Database) -> String {
        db.suppliers()
            .create(&NewSupplier {
                name: "Distribuidora".into(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_purchase_raises_stock_and_cost() {
        let db = test_db().await;
        let s = supplier(&db).await;
        let a = product(&db, "Aceite", 1500, 2).await;
        let b = product(&db, "Arroz", 700, 0).await;

        let detail = db
            .purchases()
            .record(
                &s,
                &[
                    PurchaseLineRequest {
                        product_id: a.id.clone(),
                        quantity: 10,
                        unit_cost_cents: 1100,
                    },
                    PurchaseLineRequest {
                        product_id: b.id.clone(),
                        quantity: 5,
                        unit_cost_cents: 450,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(detail.purchase.total_cents, 10 * 1100 + 5 * 450);
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(stock_of(&db, &a.id).await, 12);
        assert_eq!(stock_of(&db, &b.id).await, 5);

        let a = db.products().get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(a.cost_cents, 1100);

        let listed = db.purchases().list().await.unwrap();
        assert_eq!(listed.len(), 1);
        let fetched = db.purchases().get(&detail.purchase.id).await.unwrap().unwrap();
        assert_eq!(fetched.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let db = test_db().await;
        let s = supplier(&db).await;
        let a = product(&db, "Aceite", 1500, 2).await;

        let err = db
            .purchases()
            .record(
                &s,
                &[
                    PurchaseLineRequest {
                        product_id: a.id.clone(),
                        quantity: 10,
                        unit_cost_cents: 1100,
                    },
                    PurchaseLineRequest {
                        product_id: "missing".into(),
                        quantity: 1,
                        unit_cost_cents: 100,
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
        assert_eq!(stock_of(&db, &a.id).await, 2);
        assert!(db.purchases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_supplier() {
        let db = test_db().await;
        let a = product(&db, "Aceite", 1500, 2).await;
        let err = db
            .purchases()
            .record(
                "missing",
                &[PurchaseLineRequest {
                    product_id: a.id,
                    quantity: 1,
                    unit_cost_cents: 100,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SupplierNotFound(_))));
    }
}
