//! # Receivable Payments
//!
//! Payment application for credit invoices.
//!
//! ```text
//!   pending ──pay(part)──► partial ──pay(rest)──► paid
//!      │                                           ▲
//!      └───────────────pay(all)────────────────────┘
//! ```
//!
//! `remaining` only decreases. Overpayment and paying a settled balance are
//! rejected before anything is written.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Receivable, ReceivableStatus};
use crate::validation::validate_amount_cents;

/// Balance after a payment has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub remaining_cents: i64,
    pub status: ReceivableStatus,
}

/// Computes the new balance and status for a payment of `amount`.
pub fn apply_payment(receivable: &Receivable, amount: Money) -> CoreResult<PaymentOutcome> {
    validate_amount_cents("amount", amount.cents())?;

    if receivable.status == ReceivableStatus::Paid || receivable.remaining().is_zero() {
        return Err(CoreError::ReceivableAlreadyPaid(receivable.id.clone()));
    }

    if amount > receivable.remaining() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!(
                "payment {} exceeds remaining balance {}",
                amount,
                receivable.remaining()
            ),
        });
    }

    let remaining = receivable.remaining() - amount;
    let status = if remaining.is_zero() {
        ReceivableStatus::Paid
    } else {
        ReceivableStatus::Partial
    };

    Ok(PaymentOutcome {
        remaining_cents: remaining.cents(),
        status,
    })
}
