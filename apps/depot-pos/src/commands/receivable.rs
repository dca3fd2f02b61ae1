//! # Receivable Commands
//!
//! Payments reduce the balance and land in the ledger as credit-payment
//! income, in one transaction.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::ledger::LedgerFilter;
use depot_core::{LedgerEntry, ReceivableStatus};
use depot_db::{ReceivableFilter, ReceivableView};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPaymentRequest {
    pub receivable_id: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPaymentResponse {
    pub receivable_id: String,
    pub remaining_cents: i64,
    pub status: ReceivableStatus,
    pub ledger_entry_id: String,
}

pub async fn apply_receivable_payment(
    state: &AppState,
    request: &ApplyPaymentRequest,
) -> Result<ApplyPaymentResponse, ApiError> {
    let applied = state
        .db
        .receivables()
        .apply_payment(&request.receivable_id, request.amount_cents)
        .await?;

    info!(
        id = %applied.receivable.id,
        remaining_cents = applied.receivable.remaining_cents,
        "apply_receivable_payment command"
    );
    Ok(ApplyPaymentResponse {
        receivable_id: applied.receivable.id,
        remaining_cents: applied.receivable.remaining_cents,
        status: applied.receivable.status,
        ledger_entry_id: applied.ledger_entry.id,
    })
}

pub async fn list_receivables(
    state: &AppState,
    filter: &ReceivableFilter,
) -> Result<Vec<ReceivableView>, ApiError> {
    Ok(state.db.receivables().list(filter).await?)
}

/// Ledger entries tied to one invoice: down payment and later payments.
pub async fn payment_history(
    state: &AppState,
    invoice_id: &str,
) -> Result<Vec<LedgerEntry>, ApiError> {
    // 404 rather than an empty list for unknown invoices
    state.db.invoices().get(invoice_id).await?;

    let filter = LedgerFilter {
        invoice_id: Some(invoice_id.to_string()),
        ..LedgerFilter::default()
    };
    Ok(state.db.ledger().list(&filter, state.config.offset()).await?)
}
