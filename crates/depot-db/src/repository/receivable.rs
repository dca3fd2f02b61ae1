//! # Receivable Repository
//!
//! Credit balances. Receivables are created by
//! [`InvoiceRepository::create`](crate::repository::invoice::InvoiceRepository::create);
//! this repository applies payments and answers queries.
//!
//! ## Payment
//! ```text
//! apply_payment(id, amount)
//!   BEGIN
//!     load receivable                    NotFound
//!     depot_core::receivable::apply_payment   overpayment / already paid
//!     UPDATE receivables ... WHERE remaining_cents = <loaded value>
//!     INSERT ledger_entries (income, credit_payment, invoice ref)
//!   COMMIT
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::insert_entry;
use crate::repository::product::like_pattern;
use depot_core::receivable::apply_payment;
use depot_core::validation::validate_search_query;
use depot_core::{CoreError, LedgerEntry, LedgerKind, LedgerOrigin, Money, Receivable, ReceivableStatus};

const SELECT_RECEIVABLE: &str = "SELECT id, customer_id, invoice_id, total_cents, remaining_cents, status, created_at, updated_at FROM receivables";

/// Filter for [`ReceivableRepository::list`].
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableFilter {
    #[serde(default)]
    pub status: Option<ReceivableStatus>,
    #[serde(default)]
    pub customer_name_contains: Option<String>,
}

/// Receivable joined with customer name and invoice number.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableView {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub invoice_id: String,
    pub invoice_number: i64,
    pub total_cents: i64,
    pub remaining_cents: i64,
    /// total - remaining
    pub amount_paid_cents: i64,
    pub status: ReceivableStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Result of a payment: the updated balance and its ledger entry.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPayment {
    pub receivable: Receivable,
    pub ledger_entry: LedgerEntry,
}

#[derive(Debug, Clone)]
pub struct ReceivableRepository {
    pool: SqlitePool,
}

impl ReceivableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableRepository { pool }
    }

    /// Applies a payment to a credit balance and records it as income.
    pub async fn apply_payment(&self, id: &str, amount_cents: i64) -> DbResult<AppliedPayment> {
        debug!(id = %id, amount_cents, "Applying receivable payment");

        let mut tx = self.pool.begin().await?;

        let sql = format!("{SELECT_RECEIVABLE} WHERE id = ?1");
        let receivable = sqlx::query_as::<_, Receivable>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ReceivableNotFound(id.to_string()))?;

        let amount = Money::from_cents(amount_cents);
        let outcome = match apply_payment(&receivable, amount) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(id = %id, error = %err, "Payment rejected");
                return Err(err.into());
            }
        };

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE receivables SET remaining_cents = ?2, status = ?3, updated_at = ?4 \
             WHERE id = ?1 AND remaining_cents = ?5",
        )
        .bind(id)
        .bind(outcome.remaining_cents)
        .bind(outcome.status)
        .bind(now)
        .bind(receivable.remaining_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::QueryFailed(format!(
                "receivable {id} changed while applying payment"
            )));
        }

        let ledger_entry = insert_entry(
            &mut tx,
            LedgerKind::Income,
            amount,
            LedgerOrigin::CreditPayment,
            Some(LedgerOrigin::CreditPayment.label().to_string()),
            Some(&receivable.invoice_id),
        )
        .await?;

        tx.commit().await?;

        info!(
            id = %id,
            amount = %amount,
            remaining = outcome.remaining_cents,
            status = ?outcome.status,
            "Receivable payment applied"
        );

        Ok(AppliedPayment {
            receivable: Receivable {
                remaining_cents: outcome.remaining_cents,
                status: outcome.status,
                updated_at: now,
                ..receivable
            },
            ledger_entry,
        })
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Receivable>> {
        let sql = format!("{SELECT_RECEIVABLE} WHERE id = ?1");
        let receivable = sqlx::query_as::<_, Receivable>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receivable)
    }

    pub async fn get_by_invoice(&self, invoice_id: &str) -> DbResult<Option<Receivable>> {
        let sql = format!("{SELECT_RECEIVABLE} WHERE invoice_id = ?1");
        let receivable = sqlx::query_as::<_, Receivable>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(receivable)
    }

    /// Receivables matching the filter, oldest first.
    pub async fn list(&self, filter: &ReceivableFilter) -> DbResult<Vec<ReceivableView>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT r.id, r.customer_id, c.name AS customer_name, r.invoice_id, \
                    i.number AS invoice_number, r.total_cents, r.remaining_cents, \
                    r.total_cents - r.remaining_cents AS amount_paid_cents, \
                    r.status, r.created_at \
             FROM receivables r \
             INNER JOIN customers c ON c.id = r.customer_id \
             INNER JOIN invoices i ON i.id = r.invoice_id \
             WHERE 1 = 1",
        );

        if let Some(status) = filter.status {
            qb.push(" AND r.status = ").push_bind(status);
        }
        if let Some(fragment) = filter.customer_name_contains.as_deref() {
            let fragment = validate_search_query(fragment)?;
            if !fragment.is_empty() {
                qb.push(" AND c.name LIKE ")
                    .push_bind(like_pattern(&fragment))
                    .push(" ESCAPE '\\'");
            }
        }
        qb.push(" ORDER BY r.created_at, r.rowid");

        let receivables = qb
            .build_query_as::<ReceivableView>()
            .fetch_all(&self.pool)
            .await?;
        Ok(receivables)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::customer::CustomerInput;
    use crate::repository::test_support::{product, test_db};
    use crate::Database;
    use chrono::FixedOffset;
    use depot_core::invoice::{InvoiceLineRequest, InvoiceRequest};
    use depot_core::ledger::LedgerFilter;
    use depot_core::PaymentKind;

    /// Credit invoice of `total_cents` to a new customer; returns the receivable.
    async fn credit_sale(db: &Database, customer: &str, total_cents: i64, down: i64) -> Receivable {
        let c = db
            .customers()
            .create(&CustomerInput {
                name: customer.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let p = product(db, &format!("Producto {customer}"), total_cents, 1).await;

        db.invoices()
            .create(&InvoiceRequest {
                customer_id: Some(c.id),
                lines: vec![InvoiceLineRequest {
                    product_id: p.id,
                    quantity: 1,
                    unit_price_cents: None,
                }],
                payment_kind: PaymentKind::Credit,
                cash_tendered_cents: None,
                initial_payment_cents: Some(down),
            })
            .await
            .unwrap()
            .receivable
            .unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn test_full_payment_marks_paid() {
        let db = test_db().await;
        let r = credit_sale(&db, "Ana", 10000, 2000).await;

        let applied = db.receivables().apply_payment(&r.id, 8000).await.unwrap();
        assert_eq!(applied.receivable.remaining_cents, 0);
        assert_eq!(applied.receivable.status, ReceivableStatus::Paid);
        assert_eq!(applied.ledger_entry.amount_cents, 8000);
        assert_eq!(applied.ledger_entry.origin, LedgerOrigin::CreditPayment);
        assert_eq!(applied.ledger_entry.invoice_id.as_deref(), Some(r.invoice_id.as_str()));

        let stored = db.receivables().get(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining_cents, 0);
        assert_eq!(stored.status, ReceivableStatus::Paid);

        let history = db
            .ledger()
            .list(
                &LedgerFilter {
                    invoice_id: Some(r.invoice_id.clone()),
                    ..Default::default()
                },
                utc(),
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].origin, LedgerOrigin::CreditDownPayment);
        assert_eq!(history[1].origin, LedgerOrigin::CreditPayment);
    }

    #[tokio::test]
    async fn test_payment_on_paid_receivable_rejected() {
        let db = test_db().await;
        let r = credit_sale(&db, "Ana", 10000, 2000).await;
        db.receivables().apply_payment(&r.id, 8000).await.unwrap();

        let err = db.receivables().apply_payment(&r.id, 100).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReceivableAlreadyPaid(_))));

        let entries = db.ledger().list(&LedgerFilter::default(), utc()).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_overpayment_rejected_without_writes() {
        let db = test_db().await;
        let r = credit_sale(&db, "Ana", 5000, 0).await;

        let err = db.receivables().apply_payment(&r.id, 5001).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidPaymentAmount { .. })));

        let stored = db.receivables().get(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.remaining_cents, 5000);
        assert_eq!(stored.status, ReceivableStatus::Pending);
        assert!(db
            .ledger()
            .list(&LedgerFilter::default(), utc())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_receivable() {
        let db = test_db().await;
        let err = db.receivables().apply_payment("missing", 100).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remaining_never_increases() {
        let db = test_db().await;
        let r = credit_sale(&db, "Ana", 1000, 0).await;

        let mut previous = r.remaining_cents;
        for amount in [100, 0, 250, 2000, -5, 650] {
            let _ = db.receivables().apply_payment(&r.id, amount).await;
            let now = db.receivables().get(&r.id).await.unwrap().unwrap();
            assert!(now.remaining_cents <= previous);
            assert_eq!(now.remaining_cents == 0, now.status == ReceivableStatus::Paid);
            previous = now.remaining_cents;
        }
        assert_eq!(previous, 0);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let ana = credit_sale(&db, "Ana Lopez", 1000, 0).await;
        let bruno = credit_sale(&db, "Bruno", 2000, 500).await;
        db.receivables().apply_payment(&ana.id, 1000).await.unwrap();

        let all = db.receivables().list(&ReceivableFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let paid = db
            .receivables()
            .list(&ReceivableFilter {
                status: Some(ReceivableStatus::Paid),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].customer_name, "Ana Lopez");
        assert_eq!(paid[0].amount_paid_cents, 1000);

        let by_name = db
            .receivables()
            .list(&ReceivableFilter {
                customer_name_contains: Some("brun".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, bruno.id);
        assert_eq!(by_name[0].amount_paid_cents, 500);
        assert_eq!(by_name[0].status, ReceivableStatus::Partial);

        let found = db
            .receivables()
            .get_by_invoice(&bruno.invoice_id)
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(bruno.id));
    }
}
