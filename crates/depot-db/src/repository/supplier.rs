//! # Supplier Repository

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::new_id;
use depot_core::validation::{validate_name, validate_optional_text};
use depot_core::Supplier;

const SELECT_SUPPLIER: &str = "SELECT id, name, contact, phone, address, created_at FROM suppliers";

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        let supplier = Supplier {
            id: new_id(),
            name: validate_name("name", &input.name)?,
            contact: validate_optional_text("contact", input.contact.as_deref())?,
            phone: validate_optional_text("phone", input.phone.as_deref())?,
            address: validate_optional_text("address", input.address.as_deref())?,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO suppliers (id, name, contact, phone, address, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} WHERE id = ?1");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} ORDER BY name COLLATE NOCASE");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }
}
