//! # Invoice Rules
//!
//! Everything the invoice engine decides before touching the database:
//! request shape, unit price resolution, stock pre-checks and payment
//! settlement.
//!
//! ## Invoice Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceRequest                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate()           lines non-empty, quantities > 0,                 │
//! │       │               credit needs a named customer                    │
//! │       ▼                                                                 │
//! │  price_lines()        product exists + active, unit price resolved,    │
//! │       │               aggregated quantity <= stock                     │
//! │       ▼                                                                 │
//! │  settle()             cash: tendered >= total, change                  │
//! │       │               credit: 0 <= down payment <= total               │
//! │       ▼                                                                 │
//! │  InvoicePlan  ──────► depot-db writes it in ONE transaction            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A plan is only produced when every check passed, so the repository never
//! starts a transaction for a request that is going to be rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::aggregate_quantities;
use crate::money::Money;
use crate::types::{LedgerOrigin, PaymentKind, Product, ReceivableStatus};
use crate::validation::{
    validate_line_count, validate_price_cents, validate_quantity, validate_tender_cents,
};
use crate::WALK_IN_CUSTOMER_ID;

// =============================================================================
// Request
// =============================================================================

/// One requested line. `unit_price_cents` overrides the catalogue price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    /// `None` on a cash sale means the walk-in customer.
    #[serde(default)]
    pub customer_id: Option<String>,
    pub lines: Vec<InvoiceLineRequest>,
    pub payment_kind: PaymentKind,
    /// Cash handed over. Omitted means exact payment.
    #[serde(default)]
    pub cash_tendered_cents: Option<i64>,
    /// Down payment on a credit invoice. Omitted means zero.
    #[serde(default)]
    pub initial_payment_cents: Option<i64>,
}

impl InvoiceRequest {
    /// Shape checks that need no stored data.
    pub fn validate(&self) -> CoreResult<()> {
        validate_line_count("lines", self.lines.len())?;

        for line in &self.lines {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "productId".to_string(),
                }
                .into());
            }
            validate_quantity(line.quantity)?;
            if let Some(price) = line.unit_price_cents {
                validate_price_cents("unitPrice", price)?;
            }
        }
        if let Some(tendered) = self.cash_tendered_cents {
            validate_tender_cents("cashTendered", tendered)?;
        }
        if let Some(down) = self.initial_payment_cents {
            validate_tender_cents("initialPayment", down)?;
        }

        if self.payment_kind == PaymentKind::Credit {
            match self.customer_id.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(ValidationError::Required {
                        field: "customerId".to_string(),
                    }
                    .into())
                }
                Some(WALK_IN_CUSTOMER_ID) => {
                    return Err(CoreError::WalkInCustomer {
                        action: "sold to on credit".to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Customer the invoice is attributed to.
    pub fn effective_customer_id(&self) -> &str {
        match self.customer_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => WALK_IN_CUSTOMER_ID,
        }
    }

    /// Distinct product ids named by the request, in first-seen order.
    pub fn product_ids(&self) -> Vec<&str> {
        aggregate_quantities(self.lines.iter().map(|l| (l.product_id.as_str(), l.quantity)))
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Resolves the unit price of a line.
///
/// ## Precedence
/// 1. Price supplied by the caller (counter discount)
/// 2. Current catalogue sale price
///
/// The resolved price must be >= 0.
pub fn resolve_unit_price(caller: Option<i64>, catalog: Money) -> Result<Money, ValidationError> {
    let price = caller.map(Money::from_cents).unwrap_or(catalog);
    validate_price_cents("unitPrice", price.cents())?;
    Ok(price)
}

/// A line with its price frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl PricedLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Prices every line against the loaded products and pre-checks stock.
///
/// `products` must contain every product the request names that exists;
/// a missing key is reported as not found.
pub fn price_lines(
    lines: &[InvoiceLineRequest],
    products: &HashMap<String, Product>,
) -> CoreResult<Vec<PricedLine>> {
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        if !product.is_active() {
            return Err(CoreError::ProductInactive(product.name.clone()));
        }

        let unit_price = resolve_unit_price(line.unit_price_cents, product.price())?;

        priced.push(PricedLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price,
        });
    }

    for (product_id, requested) in
        aggregate_quantities(priced.iter().map(|l| (l.product_id.as_str(), l.quantity)))
    {
        if let Some(product) = products.get(product_id) {
            if !product.has_stock_for(requested) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested,
                });
            }
        }
    }

    Ok(priced)
}

/// Σ(quantity × unit price). Exact in cents.
pub fn invoice_total(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::line_total).sum()
}

// =============================================================================
// Settlement
// =============================================================================

/// How the invoice total is covered at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Cash { tendered: Money, change: Money },
    Credit { down_payment: Money, remaining: Money },
}

impl Settlement {
    /// Income the cash ledger must record for this invoice, if any.
    ///
    /// Ledger amounts are strictly positive, so a zero total (cash) or a zero
    /// down payment (credit) records nothing.
    pub fn ledger_income(&self, total: Money) -> Option<(Money, LedgerOrigin)> {
        match *self {
            Settlement::Cash { .. } if total.is_positive() => Some((total, LedgerOrigin::CashSale)),
            Settlement::Credit { down_payment, .. } if down_payment.is_positive() => {
                Some((down_payment, LedgerOrigin::CreditDownPayment))
            }
            _ => None,
        }
    }

    pub fn cash_tendered(&self) -> Option<Money> {
        match *self {
            Settlement::Cash { tendered, .. } => Some(tendered),
            Settlement::Credit { .. } => None,
        }
    }

    pub fn change(&self) -> Option<Money> {
        match *self {
            Settlement::Cash { change, .. } => Some(change),
            Settlement::Credit { .. } => None,
        }
    }
}

/// Applies the payment-kind rules to a computed total.
pub fn settle(
    kind: PaymentKind,
    total: Money,
    cash_tendered: Option<Money>,
    initial_payment: Option<Money>,
) -> CoreResult<Settlement> {
    match kind {
        PaymentKind::Cash => {
            if initial_payment.is_some_and(|p| !p.is_zero()) {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: "initial payment applies to credit invoices only".to_string(),
                });
            }
            let tendered = cash_tendered.unwrap_or(total);
            if tendered < total {
                return Err(CoreError::InsufficientCash {
                    total_cents: total.cents(),
                    tendered_cents: tendered.cents(),
                });
            }
            Ok(Settlement::Cash {
                tendered,
                change: tendered - total,
            })
        }
        PaymentKind::Credit => {
            if cash_tendered.is_some() {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: "cash tendered applies to cash invoices only".to_string(),
                });
            }
            let down_payment = initial_payment.unwrap_or_default();
            if down_payment.is_negative() || down_payment > total {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("initial payment must be between {} and {}", Money::zero(), total),
                });
            }
            Ok(Settlement::Credit {
                down_payment,
                remaining: total - down_payment,
            })
        }
    }
}

// =============================================================================
// Plan
// =============================================================================

/// A fully validated invoice, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePlan {
    pub customer_id: String,
    pub payment_kind: PaymentKind,
    pub lines: Vec<PricedLine>,
    pub total: Money,
    pub settlement: Settlement,
}

impl InvoicePlan {
    /// Receivable opening balance and status (credit invoices only).
    pub fn receivable_opening(&self) -> Option<(Money, ReceivableStatus)> {
        match self.settlement {
            Settlement::Credit { remaining, .. } => {
                Some((remaining, ReceivableStatus::from_balance(self.total, remaining)))
            }
            Settlement::Cash { .. } => None,
        }
    }
}

/// Runs every invoice check in order and returns the plan.
pub fn plan_invoice(
    request: &InvoiceRequest,
    products: &HashMap<String, Product>,
) -> CoreResult<InvoicePlan> {
    request.validate()?;

    let lines = price_lines(&request.lines, products)?;
    let total = invoice_total(&lines);
    let settlement = settle(
        request.payment_kind,
        total,
        request.cash_tendered_cents.map(Money::from_cents),
        request.initial_payment_cents.map(Money::from_cents),
    )?;

    Ok(InvoicePlan {
        customer_id: request.effective_customer_id().to_string(),
        payment_kind: request.payment_kind,
        lines,
        total,
        settlement,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductStatus;
    use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_LINES, MAX_PRICE_CENTS};
    use chrono::Utc;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.into(),
            name: format!("Producto {id}"),
            barcode: None,
            cost_cents: 0,
            price_cents,
            stock,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn line(product_id: &str, quantity: i64) -> InvoiceLineRequest {
        InvoiceLineRequest {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
        }
    }

    fn cash_request(lines: Vec<InvoiceLineRequest>, tendered: Option<i64>) -> InvoiceRequest {
        InvoiceRequest {
            customer_id: None,
            lines,
            payment_kind: PaymentKind::Cash,
            cash_tendered_cents: tendered,
            initial_payment_cents: None,
        }
    }

    #[test]
    fn test_cash_invoice_plan() {
        let products = catalog(vec![product("p1", 500, 10)]);
        let plan = plan_invoice(&cash_request(vec![line("p1", 3)], Some(1500)), &products).unwrap();

        assert_eq!(plan.total.cents(), 1500);
        assert_eq!(plan.customer_id, WALK_IN_CUSTOMER_ID);
        assert_eq!(plan.settlement.change(), Some(Money::zero()));
        assert_eq!(
            plan.settlement.ledger_income(plan.total),
            Some((Money::from_cents(1500), LedgerOrigin::CashSale))
        );
        assert_eq!(plan.receivable_opening(), None);
    }

    #[test]
    fn test_insufficient_cash() {
        let products = catalog(vec![product("p1", 500, 10)]);
        let err = plan_invoice(&cash_request(vec![line("p1", 3)], Some(1000)), &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientCash {
                total_cents: 1500,
                tendered_cents: 1000
            }
        ));
    }

    #[test]
    fn test_omitted_tender_is_exact_payment() {
        let settlement = settle(PaymentKind::Cash, Money::from_cents(700), None, None).unwrap();
        assert_eq!(
            settlement,
            Settlement::Cash {
                tendered: Money::from_cents(700),
                change: Money::zero()
            }
        );
    }

    #[test]
    fn test_empty_and_non_positive_lines_rejected() {
        let products = catalog(vec![product("p1", 500, 10)]);
        assert!(matches!(
            plan_invoice(&cash_request(vec![], None), &products),
            Err(CoreError::Validation(ValidationError::Empty { .. }))
        ));
        assert!(matches!(
            plan_invoice(&cash_request(vec![line("p1", 0)], None), &products),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[test]
    fn test_credit_requires_named_customer() {
        let mut request = cash_request(vec![line("p1", 1)], None);
        request.payment_kind = PaymentKind::Credit;
        assert!(matches!(
            request.validate(),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));

        request.customer_id = Some(WALK_IN_CUSTOMER_ID.to_string());
        assert!(matches!(
            request.validate(),
            Err(CoreError::WalkInCustomer { .. })
        ));
    }

    #[test]
    fn test_oversized_prices_rejected_before_totalling() {
        let products = catalog(vec![product("p1", 500, 10)]);
        let mut request = cash_request(vec![line("p1", 3)], None);
        request.lines[0].unit_price_cents = Some(i64::MAX / 2);

        assert!(matches!(
            plan_invoice(&request, &products),
            Err(CoreError::Validation(ValidationError::OutOfRange { max, .. })) if max == MAX_PRICE_CENTS
        ));

        let products = catalog(vec![product("p1", i64::MAX / 2, 10)]);
        assert!(matches!(
            plan_invoice(&cash_request(vec![line("p1", 3)], None), &products),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let products = catalog(vec![product("p1", 500, 10)]);
        assert!(matches!(
            plan_invoice(&cash_request(vec![line("p1", 1)], Some(i64::MAX)), &products),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_largest_invoice_total_fits() {
        let mut products = catalog(vec![]);
        let mut lines = Vec::new();
        for i in 0..MAX_LINES {
            let id = format!("p{i}");
            products.insert(id.clone(), product(&id, MAX_PRICE_CENTS, MAX_ITEM_QUANTITY));
            let mut l = line(&id, MAX_ITEM_QUANTITY);
            l.unit_price_cents = Some(MAX_PRICE_CENTS);
            lines.push(l);
        }

        let plan = plan_invoice(&cash_request(lines, None), &products).unwrap();
        let expected = MAX_PRICE_CENTS * MAX_ITEM_QUANTITY * MAX_LINES as i64;
        assert_eq!(plan.total.cents(), expected);
        assert!(expected <= MAX_AMOUNT_CENTS);
    }

    #[test]
    fn test_credit_down_payment() {
        let total = Money::from_cents(10_000);
        let settlement = settle(PaymentKind::Credit, total, None, Some(Money::from_cents(2_000))).unwrap();
        assert_eq!(
            settlement,
            Settlement::Credit {
                down_payment: Money::from_cents(2_000),
                remaining: Money::from_cents(8_000)
            }
        );
        assert_eq!(
            settlement.ledger_income(total),
            Some((Money::from_cents(2_000), LedgerOrigin::CreditDownPayment))
        );

        assert!(settle(PaymentKind::Credit, total, None, Some(Money::from_cents(10_001))).is_err());
        assert!(settle(PaymentKind::Credit, total, None, Some(Money::from_cents(-1))).is_err());

        let no_down = settle(PaymentKind::Credit, total, None, None).unwrap();
        assert_eq!(no_down.ledger_income(total), None);
    }

    #[test]
    fn test_credit_receivable_opening_status() {
        let products = catalog(vec![product("p1", 5_000, 10)]);
        let request = InvoiceRequest {
            customer_id: Some("c1".into()),
            lines: vec![line("p1", 2)],
            payment_kind: PaymentKind::Credit,
            cash_tendered_cents: None,
            initial_payment_cents: Some(2_000),
        };
        let plan = plan_invoice(&request, &products).unwrap();
        assert_eq!(
            plan.receivable_opening(),
            Some((Money::from_cents(8_000), ReceivableStatus::Partial))
        );
    }

    #[test]
    fn test_caller_price_wins() {
        assert_eq!(
            resolve_unit_price(Some(450), Money::from_cents(500)).unwrap().cents(),
            450
        );
        assert_eq!(
            resolve_unit_price(None, Money::from_cents(500)).unwrap().cents(),
            500
        );
        assert!(resolve_unit_price(Some(-1), Money::from_cents(500)).is_err());
    }

    #[test]
    fn test_repeated_lines_checked_on_aggregate() {
        let products = catalog(vec![product("p1", 100, 5)]);
        let ok = price_lines(&[line("p1", 2), line("p1", 3)], &products).unwrap();
        assert_eq!(invoice_total(&ok).cents(), 500);

        let err = price_lines(&[line("p1", 3), line("p1", 3)], &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_and_inactive_products() {
        let mut inactive = product("p2", 100, 5);
        inactive.status = ProductStatus::Inactive;
        let products = catalog(vec![product("p1", 100, 5), inactive]);

        assert!(matches!(
            price_lines(&[line("nope", 1)], &products),
            Err(CoreError::ProductNotFound(id)) if id == "nope"
        ));
        assert!(matches!(
            price_lines(&[line("p2", 1)], &products),
            Err(CoreError::ProductInactive(_))
        ));
    }

    #[test]
    fn test_third_line_short_rejects_whole_plan() {
        let products = catalog(vec![
            product("a", 100, 10),
            product("b", 100, 10),
            product("c", 100, 1),
            product("d", 100, 10),
        ]);
        let request = cash_request(
            vec![line("a", 1), line("b", 1), line("c", 2), line("d", 1)],
            None,
        );
        assert!(matches!(
            plan_invoice(&request, &products),
            Err(CoreError::InsufficientStock { requested: 2, .. })
        ));
    }

    #[test]
    fn test_request_from_camel_case_json() {
        let request: InvoiceRequest = serde_json::from_str(
            r#"{
                "customerId": "c1",
                "lines": [{ "productId": "p1", "quantity": 2, "unitPriceCents": 450 }],
                "paymentKind": "credit",
                "initialPaymentCents": 100
            }"#,
        )
        .unwrap();

        assert_eq!(request.payment_kind, PaymentKind::Credit);
        assert_eq!(request.lines[0].unit_price_cents, Some(450));
        assert_eq!(request.cash_tendered_cents, None);
        assert_eq!(request.effective_customer_id(), "c1");
    }
}
