//! # Cash Ledger Commands
//!
//! ## Closing Report (cierre de caja)
//! ```text
//! SummarizeLedgerRequest { from?, to?, kind?, all }
//!      │
//!      ├── all          ──► every entry, no date range (from/to must be omitted)
//!      ├── from omitted ──► today's business day (configured UTC offset)
//!      ├── to omitted   ──► same day as from
//!      ▼
//! DateRange [from 00:00, to+1 00:00) local
//!      │
//!      ▼
//! ClosingReport { summary { income, expense, net, count }, entries[] }
//! ```

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::ledger::{business_day, ClosingReport, DateRange, LedgerFilter};
use depot_core::{LedgerEntry, LedgerKind};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryRequest {
    pub kind: LedgerKind,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Petty cash, deposits, withdrawals.
pub async fn record_manual_ledger_entry(
    state: &AppState,
    request: &ManualEntryRequest,
) -> Result<LedgerEntry, ApiError> {
    let entry = state
        .db
        .ledger()
        .record_manual(request.kind, request.amount_cents, request.description.as_deref())
        .await?;
    info!(id = %entry.id, kind = ?entry.kind, amount_cents = entry.amount_cents, "record_manual_ledger_entry command");
    Ok(entry)
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeLedgerRequest {
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub kind: Option<LedgerKind>,
    /// Whole ledger instead of a date range.
    #[serde(default)]
    pub all: bool,
}

impl SummarizeLedgerRequest {
    fn to_filter(&self, today: NaiveDate) -> Result<LedgerFilter, ApiError> {
        if self.all {
            if self.from.is_some() || self.to.is_some() {
                return Err(ApiError::validation("'all' cannot be combined with 'from' or 'to'"));
            }
            return Ok(LedgerFilter {
                range: None,
                kind: self.kind,
                invoice_id: None,
            });
        }

        let from = self.from.unwrap_or(today);
        let to = self.to.unwrap_or(from);
        Ok(LedgerFilter {
            range: Some(DateRange::new(from, to)?),
            kind: self.kind,
            invoice_id: None,
        })
    }
}

fn today(state: &AppState) -> NaiveDate {
    business_day(Utc::now(), state.config.offset())
}

pub async fn summarize_ledger(
    state: &AppState,
    request: &SummarizeLedgerRequest,
) -> Result<ClosingReport, ApiError> {
    let filter = request.to_filter(today(state))?;
    let report = state.db.ledger().summarize(&filter, state.config.offset()).await?;

    info!(
        entries = report.summary.entry_count,
        net_cents = report.summary.net_cents,
        "summarize_ledger command"
    );
    Ok(report)
}

/// Same range rules as [`summarize_ledger`], entries only.
pub async fn list_ledger_entries(
    state: &AppState,
    request: &SummarizeLedgerRequest,
) -> Result<Vec<LedgerEntry>, ApiError> {
    let filter = request.to_filter(today(state))?;
    Ok(state.db.ledger().list(&filter, state.config.offset()).await?)
}
