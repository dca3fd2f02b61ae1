//! # Invoice Repository
//!
//! Writes an [`InvoicePlan`] and everything that hangs off it in a single
//! transaction.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(request)                                                        │
//! │    │                                                                    │
//! │    ├── request.validate()                    (no transaction yet)      │
//! │    │                                                                    │
//! │    ├── BEGIN                                                            │
//! │    │     ├── resolve customer (walk-in ensured)                         │
//! │    │     ├── load products ──► plan_invoice()  rejects → drop tx       │
//! │    │     ├── next number (MAX + 1)                                      │
//! │    │     ├── INSERT invoices, invoice_lines                             │
//! │    │     ├── apply_movement(-qty, sale) per line  (conditional UPDATE) │
//! │    │     ├── cash   → ledger income (cash_sale)                         │
//! │    │     └── credit → receivable + ledger income (down payment > 0)    │
//! │    └── COMMIT                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error between BEGIN and COMMIT drops the transaction, so no invoice,
//! line, stock change, receivable or ledger entry survives a failed attempt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::DbResult;
use crate::repository::inventory::{apply_movement, load_products};
use crate::repository::ledger::insert_entry;
use crate::repository::{new_id, Tx};
use depot_core::invoice::{plan_invoice, InvoicePlan, InvoiceRequest};
use depot_core::{
    CoreError, Customer, Invoice, InvoiceLine, LedgerEntry, LedgerKind, MovementKind, PaymentKind,
    Receivable, WALK_IN_CUSTOMER_ID, WALK_IN_CUSTOMER_NAME,
};

const SELECT_INVOICE: &str =
    "SELECT id, number, customer_id, total_cents, payment_kind, cash_tendered_cents, created_at FROM invoices";

// =============================================================================
// Results / Read models
// =============================================================================

/// What `create` wrote.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvoice {
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
    pub receivable: Option<Receivable>,
    pub ledger_entry: Option<LedgerEntry>,
    /// Cash invoices only; reported, not stored.
    pub change_cents: Option<i64>,
}

/// Invoice line with its product name.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub customer: Option<Customer>,
    pub lines: Vec<InvoiceLineView>,
}

/// Row of the invoice list.
#[derive(Debug, Clone, Serialize, TS, sqlx::FromRow)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub number: i64,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub payment_kind: PaymentKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates a cash or credit invoice with all its side effects.
    pub async fn create(&self, request: &InvoiceRequest) -> DbResult<CreatedInvoice> {
        request.validate()?;

        debug!(
            lines = request.lines.len(),
            payment_kind = ?request.payment_kind,
            "Creating invoice"
        );

        let mut tx = self.pool.begin().await?;

        resolve_customer(&mut tx, request.effective_customer_id()).await?;

        let products = load_products(&mut tx, &request.product_ids()).await?;
        let plan = match plan_invoice(request, &products) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "Invoice rejected");
                return Err(err.into());
            }
        };

        let created = write_plan(&mut tx, &plan).await?;
        tx.commit().await?;

        info!(
            id = %created.invoice.id,
            number = created.invoice.number,
            total = %created.invoice.total(),
            payment_kind = ?created.invoice.payment_kind,
            "Invoice created"
        );
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("{SELECT_INVOICE} WHERE id = ?1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(invoice)
    }

    /// Invoice with customer and named lines.
    pub async fn get(&self, id: &str) -> DbResult<InvoiceDetail> {
        let invoice = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;

        let customer = match &invoice.customer_id {
            Some(customer_id) => sqlx::query_as::<_, Customer>(
                "SELECT id, name, phone, address, tax_id, created_at, updated_at FROM customers WHERE id = ?1",
            )
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?,
            None => None,
        };

        let lines = sqlx::query_as::<_, InvoiceLineView>(
            "SELECT l.id, l.product_id, p.name AS product_name, l.quantity, l.unit_price_cents, \
                    l.quantity * l.unit_price_cents AS line_total_cents \
             FROM invoice_lines l \
             INNER JOIN products p ON p.id = l.product_id \
             WHERE l.invoice_id = ?1 \
             ORDER BY l.rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceDetail {
            invoice,
            customer,
            lines,
        })
    }

    /// Invoices newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<InvoiceSummary>> {
        let invoices = sqlx::query_as::<_, InvoiceSummary>(
            "SELECT i.id, i.number, c.name AS customer_name, i.total_cents, i.payment_kind, i.created_at \
             FROM invoices i \
             LEFT JOIN customers c ON c.id = i.customer_id \
             ORDER BY i.number DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(invoices)
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

async fn resolve_customer(tx: &mut Tx<'_>, customer_id: &str) -> DbResult<()> {
    if customer_id == WALK_IN_CUSTOMER_ID {
        let now = Utc::now();
        sqlx::query(
            "INSERT OR IGNORE INTO customers (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(WALK_IN_CUSTOMER_ID)
        .bind(WALK_IN_CUSTOMER_NAME)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        return Ok(());
    }

    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut **tx)
        .await?;
    if exists.is_none() {
        return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
    }
    Ok(())
}

async fn next_number(tx: &mut Tx<'_>) -> DbResult<i64> {
    let number: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(number), 0) + 1 FROM invoices")
        .fetch_one(&mut **tx)
        .await?;
    Ok(number)
}

async fn write_plan(tx: &mut Tx<'_>, plan: &InvoicePlan) -> DbResult<CreatedInvoice> {
    let now = Utc::now();
    let invoice = Invoice {
        id: new_id(),
        number: next_number(tx).await?,
        customer_id: Some(plan.customer_id.clone()),
        total_cents: plan.total.cents(),
        payment_kind: plan.payment_kind,
        cash_tendered_cents: plan.settlement.cash_tendered().map(|m| m.cents()),
        created_at: now,
    };

    sqlx::query(
        "INSERT INTO invoices (id, number, customer_id, total_cents, payment_kind, cash_tendered_cents, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&invoice.id)
    .bind(invoice.number)
    .bind(&invoice.customer_id)
    .bind(invoice.total_cents)
    .bind(invoice.payment_kind)
    .bind(invoice.cash_tendered_cents)
    .bind(invoice.created_at)
    .execute(&mut **tx)
    .await?;

    let label = invoice.receipt_label();
    let mut lines = Vec::with_capacity(plan.lines.len());
    for priced in &plan.lines {
        let line = InvoiceLine {
            id: new_id(),
            invoice_id: invoice.id.clone(),
            product_id: priced.product_id.clone(),
            quantity: priced.quantity,
            unit_price_cents: priced.unit_price.cents(),
        };

        sqlx::query(
            "INSERT INTO invoice_lines (id, invoice_id, product_id, quantity, unit_price_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&line.id)
        .bind(&line.invoice_id)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut **tx)
        .await?;

        apply_movement(tx, &line.product_id, -line.quantity, MovementKind::Sale, Some(&label)).await?;
        lines.push(line);
    }

    let ledger_entry = match plan.settlement.ledger_income(plan.total) {
        Some((amount, origin)) if amount.is_positive() => Some(
            insert_entry(
                tx,
                LedgerKind::Income,
                amount,
                origin,
                Some(format!("{} {}", origin.label(), label)),
                Some(&invoice.id),
            )
            .await?,
        ),
        _ => None,
    };

    let receivable = match plan.receivable_opening() {
        Some((remaining, status)) => {
            let receivable = Receivable {
                id: new_id(),
                customer_id: plan.customer_id.clone(),
                invoice_id: invoice.id.clone(),
                total_cents: plan.total.cents(),
                remaining_cents: remaining.cents(),
                status,
                created_at: now,
                updated_at: now,
            };

            sqlx::query(
                "INSERT INTO receivables (id, customer_id, invoice_id, total_cents, remaining_cents, status, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&receivable.id)
            .bind(&receivable.customer_id)
            .bind(&receivable.invoice_id)
            .bind(receivable.total_cents)
            .bind(receivable.remaining_cents)
            .bind(receivable.status)
            .bind(receivable.created_at)
            .bind(receivable.updated_at)
            .execute(&mut **tx)
            .await?;

            Some(receivable)
        }
        None => None,
    };

    Ok(CreatedInvoice {
        change_cents: plan.settlement.change().map(|m| m.cents()),
        invoice,
        lines,
        receivable,
        ledger_entry,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{product, stock_of, test_db};
    use crate::{Database, DbError};
    use chrono::FixedOffset;
    use depot_core::invoice::InvoiceLineRequest;
    use depot_core::ledger::LedgerFilter;
    use depot_core::{LedgerOrigin, ReceivableStatus, ValidationError};

    fn line(product_id: &str, quantity: i64) -> InvoiceLineRequest {
        InvoiceLineRequest {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn cash(lines: Vec<InvoiceLineRequest>, tendered: Option<i64>) -> InvoiceRequest {
        InvoiceRequest {
            customer_id: None,
            lines,
            payment_kind: PaymentKind::Cash,
            cash_tendered_cents: tendered,
            initial_payment_cents: None,
        }
    }

    async fn customer(db: &Database, name: &str) -> String {
        db.customers()
            .create(&crate::repository::customer::CustomerInput {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn row_count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn test_cash_invoice_walk_in() {
        let db = test_db().await;
        let p = product(&db, "Gaseosa", 500, 10).await;

        let created = db
            .invoices()
            .create(&cash(vec![line(&p.id, 3)], Some(1500)))
            .await
            .unwrap();

        assert_eq!(created.invoice.total_cents, 1500);
        assert_eq!(created.invoice.number, 1);
        assert_eq!(created.invoice.customer_id.as_deref(), Some(WALK_IN_CUSTOMER_ID));
        assert_eq!(created.change_cents, Some(0));
        assert!(created.receivable.is_none());
        assert_eq!(stock_of(&db, &p.id).await, 7);

        let entries = db.ledger().list(&LedgerFilter::default(), utc()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LedgerKind::Income);
        assert_eq!(entries[0].amount_cents, 1500);
        assert_eq!(entries[0].origin, LedgerOrigin::CashSale);
        assert_eq!(entries[0].invoice_id.as_deref(), Some(created.invoice.id.as_str()));

        let history = db.inventory().history(&p.id).await.unwrap();
        let sale = history.last().unwrap();
        assert_eq!(sale.kind, MovementKind::Sale);
        assert_eq!(sale.quantity, -3);
        assert_eq!(sale.note.as_deref(), Some("INT-0001"));
    }

    #[tokio::test]
    async fn test_cash_change_reported() {
        let db = test_db().await;
        let p = product(&db, "Pan", 125, 10).await;

        let created = db
            .invoices()
            .create(&cash(vec![line(&p.id, 2)], Some(500)))
            .await
            .unwrap();
        assert_eq!(created.change_cents, Some(250));
        assert_eq!(created.invoice.cash_tendered_cents, Some(500));
    }

    #[tokio::test]
    async fn test_insufficient_cash_writes_nothing() {
        let db = test_db().await;
        let p = product(&db, "Gaseosa", 500, 10).await;

        let err = db
            .invoices()
            .create(&cash(vec![line(&p.id, 3)], Some(1000)))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InsufficientCash { .. })));
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(row_count(&db, "invoices").await, 0);
        assert_eq!(row_count(&db, "ledger_entries").await, 0);
    }

    #[tokio::test]
    async fn test_credit_invoice_with_down_payment() {
        let db = test_db().await;
        let c = customer(&db, "Ana").await;
        let p = product(&db, "Caja de aceite", 10000, 5).await;

        let created = db
            .invoices()
            .create(&InvoiceRequest {
                customer_id: Some(c.clone()),
                lines: vec![line(&p.id, 1)],
                payment_kind: PaymentKind::Credit,
                cash_tendered_cents: None,
                initial_payment_cents: Some(2000),
            })
            .await
            .unwrap();

        let receivable = created.receivable.unwrap();
        assert_eq!(receivable.total_cents, 10000);
        assert_eq!(receivable.remaining_cents, 8000);
        assert_eq!(receivable.status, ReceivableStatus::Partial);
        assert_eq!(receivable.customer_id, c);

        let entry = created.ledger_entry.unwrap();
        assert_eq!(entry.amount_cents, 2000);
        assert_eq!(entry.origin, LedgerOrigin::CreditDownPayment);
        assert_eq!(row_count(&db, "ledger_entries").await, 1);
    }

    #[tokio::test]
    async fn test_credit_without_down_payment_is_pending() {
        let db = test_db().await;
        let c = customer(&db, "Ana").await;
        let p = product(&db, "Harina", 800, 5).await;

        let created = db
            .invoices()
            .create(&InvoiceRequest {
                customer_id: Some(c),
                lines: vec![line(&p.id, 2)],
                payment_kind: PaymentKind::Credit,
                cash_tendered_cents: None,
                initial_payment_cents: None,
            })
            .await
            .unwrap();

        let receivable = created.receivable.unwrap();
        assert_eq!(receivable.status, ReceivableStatus::Pending);
        assert_eq!(receivable.remaining_cents, 1600);
        assert!(created.ledger_entry.is_none());
        assert_eq!(row_count(&db, "ledger_entries").await, 0);
    }

    #[tokio::test]
    async fn test_credit_requires_named_customer() {
        let db = test_db().await;
        let p = product(&db, "Harina", 800, 5).await;

        let mut request = InvoiceRequest {
            customer_id: None,
            lines: vec![line(&p.id, 1)],
            payment_kind: PaymentKind::Credit,
            cash_tendered_cents: None,
            initial_payment_cents: None,
        };
        let err = db.invoices().create(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));

        request.customer_id = Some(WALK_IN_CUSTOMER_ID.to_string());
        let err = db.invoices().create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::WalkInCustomer { .. })));

        request.customer_id = Some("missing".to_string());
        let err = db.invoices().create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CustomerNotFound(_))));
        assert_eq!(stock_of(&db, &p.id).await, 5);
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_invoice() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 200, 10).await;
        let c = product(&db, "C", 300, 1).await;
        let d = product(&db, "D", 400, 10).await;

        let err = db
            .invoices()
            .create(&cash(
                vec![line(&a.id, 2), line(&b.id, 2), line(&c.id, 2), line(&d.id, 2)],
                None,
            ))
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                product,
                available,
                requested,
            }) => {
                assert_eq!(product, "C");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        for (id, stock) in [(&a.id, 10), (&b.id, 10), (&c.id, 1), (&d.id, 10)] {
            assert_eq!(stock_of(&db, id).await, stock);
        }
        for table in ["invoices", "invoice_lines", "receivables", "ledger_entries"] {
            assert_eq!(row_count(&db, table).await, 0, "{table}");
        }
        // Only the initial-stock entries remain
        assert_eq!(row_count(&db, "inventory_movements").await, 4);
    }

    #[tokio::test]
    async fn test_repeated_lines_checked_on_aggregate() {
        let db = test_db().await;
        let p = product(&db, "Huevos", 150, 5).await;

        let err = db
            .invoices()
            .create(&cash(vec![line(&p.id, 3), line(&p.id, 3)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(stock_of(&db, &p.id).await, 5);

        db.invoices()
            .create(&cash(vec![line(&p.id, 2), line(&p.id, 3)], None))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 0);
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_products_rejected() {
        let db = test_db().await;
        let p = product(&db, "Descontinuado", 150, 5).await;
        db.products().deactivate(&p.id).await.unwrap();

        let err = db
            .invoices()
            .create(&cash(vec![line(&p.id, 1)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductInactive(_))));

        let err = db
            .invoices()
            .create(&cash(vec![line("missing", 1)], None))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_caller_price_overrides_catalogue() {
        let db = test_db().await;
        let p = product(&db, "Queso", 2000, 5).await;

        let mut discounted = line(&p.id, 2);
        discounted.unit_price_cents = Some(1750);
        let created = db
            .invoices()
            .create(&cash(vec![discounted], None))
            .await
            .unwrap();

        assert_eq!(created.invoice.total_cents, 3500);
        assert_eq!(created.lines[0].unit_price_cents, 1750);
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_and_detail_lists_names() {
        let db = test_db().await;
        let p = product(&db, "Cafe", 2500, 10).await;

        let first = db
            .invoices()
            .create(&cash(vec![line(&p.id, 1)], None))
            .await
            .unwrap();
        let second = db
            .invoices()
            .create(&cash(vec![line(&p.id, 2)], None))
            .await
            .unwrap();

        assert_eq!(first.invoice.number, 1);
        assert_eq!(second.invoice.number, 2);
        assert_eq!(second.invoice.receipt_label(), "INT-0002");

        let detail = db.invoices().get(&second.invoice.id).await.unwrap();
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].product_name, "Cafe");
        assert_eq!(detail.lines[0].line_total_cents, 5000);
        assert!(detail.customer.is_some_and(|c| c.is_walk_in()));

        let listed = db.invoices().list(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].number, 2);
        assert_eq!(listed[0].customer_name.as_deref(), Some(WALK_IN_CUSTOMER_NAME));

        let err = db.invoices().get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
