//! # Cash Ledger Rules
//!
//! Business-day ranges and aggregation for the cash ledger and the closing
//! report (cierre de caja).
//!
//! ## Business Day
//! ```text
//! Timestamps are stored in UTC. A business day is a calendar day in the
//! store's fixed UTC offset:
//!
//!   offset = -06:00, day = 2026-03-14
//!   ──► [2026-03-14T06:00Z, 2026-03-15T06:00Z)
//! ```
//!
//! Aggregation is exact integer arithmetic, so `net == income - expense`
//! holds for any filter.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LedgerEntry, LedgerKind};
use crate::validation::{validate_amount_cents, validate_optional_text, ValidationResult};

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive range of business days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> ValidationResult<Self> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "dateRange".to_string(),
                reason: format!("start {from} is after end {to}"),
            });
        }
        Ok(DateRange { from, to })
    }

    /// A single business day.
    pub fn day(day: NaiveDate) -> Self {
        DateRange { from: day, to: day }
    }

    /// Half-open UTC bounds `[start, end)` of the range.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_midnight_utc(self.from, offset);
        let end = self
            .to
            .succ_opt()
            .map(|next| local_midnight_utc(next, offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>, offset: FixedOffset) -> bool {
        let (start, end) = self.utc_bounds(offset);
        at >= start && at < end
    }
}

fn local_midnight_utc(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = day.and_time(NaiveTime::MIN);
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Business day that `at` falls on.
pub fn business_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

// =============================================================================
// Filter / Manual Entry
// =============================================================================

/// Filter for listing and summarizing ledger entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFilter {
    #[serde(default)]
    pub range: Option<DateRange>,
    #[serde(default)]
    pub kind: Option<LedgerKind>,
    /// Entries tied to one invoice (credit payment history).
    #[serde(default)]
    pub invoice_id: Option<String>,
}

/// Checked manual entry: amount > 0, description trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEntry {
    pub kind: LedgerKind,
    pub amount: Money,
    pub description: Option<String>,
}

pub fn validate_manual_entry(
    kind: LedgerKind,
    amount_cents: i64,
    description: Option<&str>,
) -> ValidationResult<ManualEntry> {
    validate_amount_cents("amount", amount_cents)?;
    Ok(ManualEntry {
        kind,
        amount: Money::from_cents(amount_cents),
        description: validate_optional_text("description", description)?,
    })
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    /// income - expense; may be negative.
    pub net_cents: i64,
    pub entry_count: usize,
}

impl LedgerSummary {
    pub fn net(&self) -> Money {
        Money::from_cents(self.net_cents)
    }
}

/// Totals over a set of entries.
pub fn summarize<'a, I>(entries: I) -> LedgerSummary
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut income = Money::zero();
    let mut expense = Money::zero();
    let mut count = 0;

    for entry in entries {
        match entry.kind {
            LedgerKind::Income => income = income.saturating_add(entry.amount()),
            LedgerKind::Expense => expense = expense.saturating_add(entry.amount()),
        }
        count += 1;
    }

    LedgerSummary {
        total_income_cents: income.cents(),
        total_expense_cents: expense.cents(),
        net_cents: income.saturating_sub(expense).cents(),
        entry_count: count,
    }
}

/// Closing report: totals plus every matching entry, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClosingReport {
    pub range: Option<DateRange>,
    pub kind: Option<LedgerKind>,
    pub summary: LedgerSummary,
    pub entries: Vec<LedgerEntry>,
}

impl ClosingReport {
    pub fn build(filter: &LedgerFilter, mut entries: Vec<LedgerEntry>) -> Self {
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        ClosingReport {
            range: filter.range,
            kind: filter.kind,
            summary: summarize(&entries),
            entries,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
