//! # Ledger Repository
//!
//! The cash ledger is append-only. Entries come from four places:
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────┬────────────────────┐
//! │ Writer                   │ Origin               │ Kind               │
//! ├──────────────────────────┼──────────────────────┼────────────────────┤
//! │ InvoiceRepository        │ cash_sale            │ income             │
//! │ InvoiceRepository        │ credit_down_payment  │ income             │
//! │ ReceivableRepository     │ credit_payment       │ income             │
//! │ record_manual            │ manual               │ income / expense   │
//! └──────────────────────────┴──────────────────────┴────────────────────┘
//! ```
//!
//! There is no update or delete. Reports filter on the UTC bounds of a
//! range of business days.

use chrono::{FixedOffset, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::{new_id, Tx};
use depot_core::ledger::{validate_manual_entry, ClosingReport, LedgerFilter};
use depot_core::{LedgerEntry, LedgerKind, LedgerOrigin, Money};

/// Appends one entry inside the caller's transaction.
pub async fn insert_entry(
    tx: &mut Tx<'_>,
    kind: LedgerKind,
    amount: Money,
    origin: LedgerOrigin,
    description: Option<String>,
    invoice_id: Option<&str>,
) -> DbResult<LedgerEntry> {
    let entry = LedgerEntry {
        id: new_id(),
        kind,
        amount_cents: amount.cents(),
        origin,
        description,
        invoice_id: invoice_id.map(str::to_string),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO ledger_entries (id, kind, amount_cents, origin, description, invoice_id, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&entry.id)
    .bind(entry.kind)
    .bind(entry.amount_cents)
    .bind(entry.origin)
    .bind(&entry.description)
    .bind(&entry.invoice_id)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;

    debug!(id = %entry.id, kind = ?kind, origin = ?origin, amount = %amount, "Ledger entry appended");
    Ok(entry)
}

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Records a manual income or expense.
    pub async fn record_manual(
        &self,
        kind: LedgerKind,
        amount_cents: i64,
        description: Option<&str>,
    ) -> DbResult<LedgerEntry> {
        let manual = validate_manual_entry(kind, amount_cents, description)?;

        let mut tx = self.pool.begin().await?;
        let entry = insert_entry(
            &mut tx,
            manual.kind,
            manual.amount,
            LedgerOrigin::Manual,
            manual.description,
            None,
        )
        .await?;
        tx.commit().await?;

        info!(id = %entry.id, kind = ?kind, amount = %manual.amount, "Manual ledger entry recorded");
        Ok(entry)
    }

    /// Entries matching the filter, oldest first.
    ///
    /// `offset` is the store's UTC offset, used to turn business days into
    /// UTC bounds.
    pub async fn list(&self, filter: &LedgerFilter, offset: FixedOffset) -> DbResult<Vec<LedgerEntry>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, kind, amount_cents, origin, description, invoice_id, created_at \
             FROM ledger_entries WHERE 1 = 1",
        );

        if let Some(range) = filter.range {
            let (start, end) = range.utc_bounds(offset);
            qb.push(" AND created_at >= ").push_bind(start);
            qb.push(" AND created_at < ").push_bind(end);
        }
        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(invoice_id) = &filter.invoice_id {
            qb.push(" AND invoice_id = ").push_bind(invoice_id.clone());
        }
        qb.push(" ORDER BY created_at, rowid");

        let entries = qb
            .build_query_as::<LedgerEntry>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = entries.len(), "Ledger entries listed");
        Ok(entries)
    }

    /// Totals plus every matching entry (closing report).
    pub async fn summarize(&self, filter: &LedgerFilter, offset: FixedOffset) -> DbResult<ClosingReport> {
        let entries = self.list(filter, offset).await?;
        let report = ClosingReport::build(filter, entries);

        info!(
            entries = report.summary.entry_count,
            income = report.summary.total_income_cents,
            expense = report.summary.total_expense_cents,
            "Ledger summarized"
        );
        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::{Duration, NaiveDate};
    use depot_core::ledger::{summarize, DateRange};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[tokio::test]
    async fn test_manual_entries_and_summary() {
        let db = test_db().await;
        let ledger = db.ledger();
        ledger
            .record_manual(LedgerKind::Income, 5000, Some("fondo inicial"))
            .await
            .unwrap();
        ledger
            .record_manual(LedgerKind::Expense, 1250, Some("bolsas"))
            .await
            .unwrap();

        let report = ledger.summarize(&LedgerFilter::default(), utc()).await.unwrap();
        assert_eq!(report.summary.total_income_cents, 5000);
        assert_eq!(report.summary.total_expense_cents, 1250);
        assert_eq!(report.summary.net_cents, 3750);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].origin, LedgerOrigin::Manual);
        assert_eq!(report.entries[0].description.as_deref(), Some("fondo inicial"));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let db = test_db().await;
        assert!(db.ledger().record_manual(LedgerKind::Income, 0, None).await.is_err());
        assert!(db.ledger().record_manual(LedgerKind::Expense, -5, None).await.is_err());
        assert!(db
            .ledger()
            .list(&LedgerFilter::default(), utc())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let db = test_db().await;
        db.ledger().record_manual(LedgerKind::Income, 100, None).await.unwrap();
        db.ledger().record_manual(LedgerKind::Expense, 40, None).await.unwrap();

        let filter = LedgerFilter {
            kind: Some(LedgerKind::Expense),
            ..Default::default()
        };
        let report = db.ledger().summarize(&filter, utc()).await.unwrap();
        assert_eq!(report.summary.entry_count, 1);
        assert_eq!(report.summary.total_income_cents, 0);
        assert_eq!(report.summary.net_cents, -40);
    }

    #[tokio::test]
    async fn test_date_range_filter() {
        let db = test_db().await;
        db.ledger().record_manual(LedgerKind::Income, 100, None).await.unwrap();

        let today = Utc::now().date_naive();
        let today_only = LedgerFilter {
            range: Some(DateRange::day(today)),
            ..Default::default()
        };
        assert_eq!(db.ledger().list(&today_only, utc()).await.unwrap().len(), 1);

        let yesterday = today - Duration::days(1);
        let past = LedgerFilter {
            range: Some(DateRange::day(yesterday)),
            ..Default::default()
        };
        assert!(db.ledger().list(&past, utc()).await.unwrap().is_empty());

        let wide = LedgerFilter {
            range: Some(
                DateRange::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), today).unwrap(),
            ),
            ..Default::default()
        };
        assert_eq!(db.ledger().list(&wide, utc()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_is_additive_over_disjoint_filters() {
        let db = test_db().await;
        for (kind, cents) in [
            (LedgerKind::Income, 1000),
            (LedgerKind::Expense, 300),
            (LedgerKind::Income, 250),
            (LedgerKind::Expense, 75),
        ] {
            db.ledger().record_manual(kind, cents, None).await.unwrap();
        }

        let all = db.ledger().list(&LedgerFilter::default(), utc()).await.unwrap();
        let (early, late) = all.split_at(2);
        let a = summarize(early);
        let b = summarize(late);
        let whole = summarize(&all);

        assert_eq!(a.total_income_cents + b.total_income_cents, whole.total_income_cents);
        assert_eq!(a.total_expense_cents + b.total_expense_cents, whole.total_expense_cents);
        assert_eq!(a.net_cents + b.net_cents, whole.net_cents);
        assert_eq!(whole.net_cents, 1250 - 375);
    }
}
