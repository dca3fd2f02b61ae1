//! # Invoice Commands
//!
//! ## create_invoice
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend                   Command                     Database        │
//! │                                                                         │
//! │  InvoiceRequest ──────────► create_invoice ───────────► BEGIN           │
//! │  { customerId?,                                          resolve cust.  │
//! │    lines[],                                              price + check  │
//! │    paymentKind,                                          invoice+lines  │
//! │    cashTenderedCents?,                                   stock moves    │
//! │    initialPaymentCents? }                                ledger entry   │
//! │                                                          receivable     │
//! │  CreateInvoiceResponse ◄──────────────────────────────── COMMIT         │
//! │  { invoiceId, number, receiptLabel, totalCents,                         │
//! │    changeCents?, receivableId? }                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any rejected rule rolls the whole invoice back; nothing is half-written.

use std::time::Instant;

use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::AppState;
use depot_core::invoice::InvoiceRequest;
use depot_db::{InvoiceDetail, InvoiceSummary};

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub invoice_id: String,
    pub number: i64,
    /// e.g. `INT-0042`
    pub receipt_label: String,
    pub total_cents: i64,
    /// Cash invoices only.
    pub change_cents: Option<i64>,
    /// Credit invoices only.
    pub receivable_id: Option<String>,
    pub remaining_cents: Option<i64>,
}

pub async fn create_invoice(
    state: &AppState,
    request: &InvoiceRequest,
) -> Result<CreateInvoiceResponse, ApiError> {
    let start = Instant::now();

    let created = state.db.invoices().create(request).await?;

    let response = CreateInvoiceResponse {
        invoice_id: created.invoice.id.clone(),
        number: created.invoice.number,
        receipt_label: created.invoice.receipt_label(),
        total_cents: created.invoice.total_cents,
        change_cents: created.change_cents,
        receivable_id: created.receivable.as_ref().map(|r| r.id.clone()),
        remaining_cents: created.receivable.as_ref().map(|r| r.remaining_cents),
    };

    info!(
        label = %response.receipt_label,
        total_cents = response.total_cents,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "create_invoice command"
    );
    Ok(response)
}

pub async fn get_invoice(state: &AppState, id: &str) -> Result<InvoiceDetail, ApiError> {
    Ok(state.db.invoices().get(id).await?)
}

/// Newest first. `limit` defaults to 50, capped at 500.
pub async fn list_invoices(
    state: &AppState,
    limit: Option<u32>,
) -> Result<Vec<InvoiceSummary>, ApiError> {
    let limit = limit.unwrap_or(50).min(500);
    Ok(state.db.invoices().list(limit).await?)
}
