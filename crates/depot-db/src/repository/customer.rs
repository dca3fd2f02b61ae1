//! # Customer Repository
//!
//! Customer records plus the walk-in sentinel ("Mostrador") that cash sales
//! without a named customer are attributed to.
//!
//! The walk-in row is created at startup and can be neither edited nor
//! deleted. Customers referenced by invoices cannot be deleted either.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::new_id;
use crate::repository::product::like_pattern;
use depot_core::validation::{validate_name, validate_optional_text, validate_search_query};
use depot_core::{CoreError, Customer, WALK_IN_CUSTOMER_ID, WALK_IN_CUSTOMER_NAME};

const SELECT_CUSTOMER: &str =
    "SELECT id, name, phone, address, tax_id, created_at, updated_at FROM customers";

/// Customer fields for create and update.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

struct CheckedCustomer {
    name: String,
    phone: Option<String>,
    address: Option<String>,
    tax_id: Option<String>,
}

impl CustomerInput {
    fn check(&self) -> DbResult<CheckedCustomer> {
        Ok(CheckedCustomer {
            name: validate_name("name", &self.name)?,
            phone: validate_optional_text("phone", self.phone.as_deref())?,
            address: validate_optional_text("address", self.address.as_deref())?,
            tax_id: validate_optional_text("taxId", self.tax_id.as_deref())?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates the walk-in customer if it is missing. Idempotent.
    pub async fn ensure_walk_in(&self) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO customers (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(WALK_IN_CUSTOMER_ID)
        .bind(WALK_IN_CUSTOMER_NAME)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Walk-in customer created");
        }
        Ok(())
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        let checked = input.check()?;
        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            name: checked.name,
            phone: checked.phone,
            address: checked.address,
            tax_id: checked.tax_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO customers (id, name, phone, address, tax_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.tax_id)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, name = %customer.name, "Customer created");
        Ok(customer)
    }

    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        if id == WALK_IN_CUSTOMER_ID {
            return Err(CoreError::WalkInCustomer {
                action: "edited".to_string(),
            }
            .into());
        }
        let checked = input.check()?;

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, phone = ?3, address = ?4, tax_id = ?5, updated_at = ?6 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&checked.name)
        .bind(&checked.phone)
        .bind(&checked.address)
        .bind(&checked.tax_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CustomerNotFound(id.to_string()).into());
        }

        info!(id = %id, "Customer updated");
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()).into())
    }

    /// Deletes a customer that no invoice refers to.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if id == WALK_IN_CUSTOMER_ID {
            return Err(CoreError::WalkInCustomer {
                action: "deleted".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let invoices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE customer_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if invoices > 0 {
            warn!(id = %id, invoices, "Refusing to delete customer with invoices");
            return Err(CoreError::CustomerInUse(id.to_string()).into());
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::CustomerNotFound(id.to_string()).into());
        }

        tx.commit().await?;
        info!(id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("{SELECT_CUSTOMER} WHERE id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    /// Lists customers by name, optionally filtered by a name fragment.
    /// The walk-in customer is listed first.
    pub async fn list(&self, query: &str) -> DbResult<Vec<Customer>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Listing customers");

        let sql = format!(
            "{SELECT_CUSTOMER} WHERE ?1 = '' OR name LIKE ?2 ESCAPE '\\' \
             ORDER BY id <> ?3, name COLLATE NOCASE"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(&query)
            .bind(like_pattern(&query))
            .bind(WALK_IN_CUSTOMER_ID)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
