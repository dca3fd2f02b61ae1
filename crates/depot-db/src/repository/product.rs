//! # Product Repository
//!
//! Catalogue administration: create, edit, activate/deactivate, absolute
//! stock counts, and the two listings.
//!
//! ## Listings
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_for_sale("acei")        list_all()                               │
//! │  ───────────────────          ──────────                               │
//! │  status = 'active' only       every product                            │
//! │  name LIKE '%acei%'           (admin screen, inactive included)        │
//! │  or barcode = 'acei'                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are never deleted: invoice, route and purchase lines keep
//! pointing at them. Deactivation hides them from the sale-facing listing.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::apply_movement;
use crate::repository::{new_id, Tx};
use depot_core::inventory::adjustment_delta;
use depot_core::validation::{
    validate_barcode, validate_name, validate_optional_text, validate_price_cents,
    validate_search_query, validate_stock_count,
};
use depot_core::{CoreError, MovementKind, Product, ProductStatus, ValidationError};

const SELECT_PRODUCT: &str = "SELECT id, name, barcode, cost_cents, price_cents, stock, status, created_at, updated_at FROM products";

/// Fields of a new product.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub cost_cents: i64,
    pub price_cents: i64,
    /// Recorded as an `entry` movement when > 0.
    #[serde(default)]
    pub initial_stock: i64,
}

/// Editable product fields. Stock is not editable here, see
/// [`ProductRepository::set_stock`].
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub cost_cents: i64,
    pub price_cents: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product and records its initial stock.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let name = validate_name("name", &input.name)?;
        let barcode = validate_barcode(input.barcode.as_deref())?;
        validate_price_cents("cost", input.cost_cents)?;
        validate_price_cents("price", input.price_cents)?;
        validate_stock_count(input.initial_stock)?;

        debug!(name = %name, "Creating product");

        let mut tx = self.pool.begin().await?;
        ensure_unique_fields(&mut tx, None, &name, barcode.as_deref()).await?;

        let now = Utc::now();
        let id = new_id();
        sqlx::query(
            "INSERT INTO products (id, name, barcode, cost_cents, price_cents, stock, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?7)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&barcode)
        .bind(input.cost_cents)
        .bind(input.price_cents)
        .bind(ProductStatus::Active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if input.initial_stock > 0 {
            apply_movement(
                &mut tx,
                &id,
                input.initial_stock,
                MovementKind::Entry,
                Some("initial stock"),
            )
            .await?;
        }

        let product = fetch_in_tx(&mut tx, &id).await?;
        tx.commit().await?;

        info!(id = %product.id, name = %product.name, stock = product.stock, "Product created");
        Ok(product)
    }

    /// Edits name, barcode, cost and price.
    pub async fn update(&self, id: &str, input: &ProductUpdate) -> DbResult<Product> {
        let name = validate_name("name", &input.name)?;
        let barcode = validate_barcode(input.barcode.as_deref())?;
        validate_price_cents("cost", input.cost_cents)?;
        validate_price_cents("price", input.price_cents)?;

        let mut tx = self.pool.begin().await?;
        ensure_unique_fields(&mut tx, Some(id), &name, barcode.as_deref()).await?;

        let result = sqlx::query(
            "UPDATE products SET name = ?2, barcode = ?3, cost_cents = ?4, price_cents = ?5, updated_at = ?6 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&name)
        .bind(&barcode)
        .bind(input.cost_cents)
        .bind(input.price_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        let product = fetch_in_tx(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, "Product updated");
        Ok(product)
    }

    /// Sets stock to an absolute physical count.
    ///
    /// The signed difference is recorded as an `adjustment` movement; a count
    /// equal to the current stock records nothing.
    pub async fn set_stock(&self, id: &str, count: i64, note: Option<&str>) -> DbResult<Product> {
        validate_stock_count(count)?;
        let note = validate_optional_text("note", note)?;

        let mut tx = self.pool.begin().await?;
        let current = fetch_in_tx(&mut tx, id).await?;

        let delta = adjustment_delta(current.stock, count);
        if delta != 0 {
            apply_movement(&mut tx, id, delta, MovementKind::Adjustment, note.as_deref()).await?;
        }

        let product = fetch_in_tx(&mut tx, id).await?;
        tx.commit().await?;

        info!(id = %id, from = current.stock, to = product.stock, "Stock count set");
        Ok(product)
    }

    /// Deactivates or reactivates a product. Stock is untouched.
    pub async fn set_status(&self, id: &str, status: ProductStatus) -> DbResult<Product> {
        let result = sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        info!(id = %id, status = ?status, "Product status changed");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<Product> {
        self.set_status(id, ProductStatus::Inactive).await
    }

    pub async fn reactivate(&self, id: &str) -> DbResult<Product> {
        self.set_status(id, ProductStatus::Active).await
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Gets a product by barcode (scanner input).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE barcode = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Sale-facing listing: active products, optionally filtered by name
    /// fragment or exact barcode.
    pub async fn list_for_sale(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit, "Listing products for sale");

        let products = if query.is_empty() {
            let sql = format!("{SELECT_PRODUCT} WHERE status = 'active' ORDER BY name LIMIT ?1");
            sqlx::query_as::<_, Product>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!(
                "{SELECT_PRODUCT} WHERE status = 'active' AND (name LIKE ?1 ESCAPE '\\' OR barcode = ?2) \
                 ORDER BY name LIMIT ?3"
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(like_pattern(&query))
                .bind(&query)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(products)
    }

    /// Administrative listing: every product, inactive included.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY name");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Counts all products (used by the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// `%fragment%` with LIKE wildcards escaped.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn fetch_in_tx(tx: &mut Tx<'_>, id: &str) -> DbResult<Product> {
    let sql = format!("{SELECT_PRODUCT} WHERE id = ?1");
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
}

/// Name (case-insensitive) and barcode must be unique across products.
async fn ensure_unique_fields(
    tx: &mut Tx<'_>,
    except_id: Option<&str>,
    name: &str,
    barcode: Option<&str>,
) -> DbResult<()> {
    let clash: Option<String> =
        sqlx::query_scalar("SELECT id FROM products WHERE name = ?1 AND id IS NOT ?2")
            .bind(name)
            .bind(except_id)
            .fetch_optional(&mut **tx)
            .await?;
    if clash.is_some() {
        return Err(duplicate("name", name));
    }

    if let Some(barcode) = barcode {
        let clash: Option<String> =
            sqlx::query_scalar("SELECT id FROM products WHERE barcode = ?1 AND id IS NOT ?2")
                .bind(barcode)
                .bind(except_id)
                .fetch_optional(&mut **tx)
                .await?;
        if clash.is_some() {
            return Err(duplicate("barcode", barcode));
        }
    }

    Ok(())
}

fn duplicate(field: &str, value: &str) -> DbError {
    ValidationError::Duplicate {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product, test_db};

    fn new_product(name: &str, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            barcode: barcode.map(str::to_string),
            cost_cents: 300,
            price_cents: 500,
            initial_stock: 10,
        }
    }

    #[tokio::test]
    async fn test_create_records_initial_entry() {
        let db = test_db().await;
        let p = db
            .products()
            .create(&new_product("Aceite 1L", Some("7401000000011")))
            .await
            .unwrap();

        assert_eq!(p.stock, 10);
        assert!(p.is_active());

        let history = db.inventory().history(&p.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, MovementKind::Entry);
        assert_eq!(history[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_zero_initial_stock_records_nothing() {
        let db = test_db().await;
        let mut input = new_product("Vinagre", None);
        input.initial_stock = 0;
        let p = db.products().create(&input).await.unwrap();
        assert!(db.inventory().history(&p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_and_barcode_rejected() {
        let db = test_db().await;
        db.products()
            .create(&new_product("Aceite 1L", Some("111")))
            .await
            .unwrap();

        let err = db
            .products()
            .create(&new_product("ACEITE 1l", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let err = db
            .products()
            .create(&new_product("Otro", Some("111")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let db = test_db().await;
        let p = product(&db, "Frijol", 900, 7).await;

        let updated = db
            .products()
            .update(
                &p.id,
                &ProductUpdate {
                    name: "Frijol negro".into(),
                    barcode: Some("222".into()),
                    cost_cents: 600,
                    price_cents: 950,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Frijol negro");
        assert_eq!(updated.price_cents, 950);
        assert_eq!(updated.stock, 7);

        let err = db
            .products()
            .update(
                "missing",
                &ProductUpdate {
                    name: "x".into(),
                    barcode: None,
                    cost_cents: 0,
                    price_cents: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_stock_records_adjustment() {
        let db = test_db().await;
        let p = product(&db, "Cafe", 2500, 10).await;

        let counted = db.products().set_stock(&p.id, 8, Some("conteo")).await.unwrap();
        assert_eq!(counted.stock, 8);

        let history = db.inventory().history(&p.id).await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.kind, MovementKind::Adjustment);
        assert_eq!(last.quantity, -2);

        // Same count again: no new movement
        db.products().set_stock(&p.id, 8, None).await.unwrap();
        assert_eq!(db.inventory().history(&p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deactivated_products_hidden_from_sale_listing() {
        let db = test_db().await;
        let a = product(&db, "Leche", 1200, 5).await;
        product(&db, "Leche deslactosada", 1500, 5).await;

        db.products().deactivate(&a.id).await.unwrap();

        let for_sale = db.products().list_for_sale("leche", 20).await.unwrap();
        assert_eq!(for_sale.len(), 1);
        assert_eq!(for_sale[0].name, "Leche deslactosada");

        let all = db.products().list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let reactivated = db.products().reactivate(&a.id).await.unwrap();
        assert!(reactivated.is_active());
        assert_eq!(reactivated.stock, 5);
    }

    #[tokio::test]
    async fn test_get_by_barcode() {
        let db = test_db().await;
        let p = db
            .products()
            .create(&new_product("Jabon", Some("7409999")))
            .await
            .unwrap();

        let found = db.products().get_by_barcode("7409999").await.unwrap();
        assert_eq!(found.map(|f| f.id), Some(p.id));
        assert!(db.products().get_by_barcode("000").await.unwrap().is_none());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
