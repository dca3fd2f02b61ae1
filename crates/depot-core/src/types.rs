//! # Domain Types
//!
//! Core domain types used throughout Depot POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│ InventoryMove-  │   │    Customer     │       │
//! │  │  stock (≥ 0)    │   │ ment (append)   │   │  walk-in = fixed│       │
//! │  │  status         │   └─────────────────┘   └────────┬────────┘       │
//! │  └───────▲─────────┘                                  │                 │
//! │          │            ┌─────────────────┐   ┌─────────▼───────┐        │
//! │          ├────────────│  InvoiceLine    │──►│    Invoice      │        │
//! │          │            │  price frozen   │   │  cash | credit  │        │
//! │          │            └─────────────────┘   └──┬──────────┬───┘        │
//! │          │                                     │          │             │
//! │          │            ┌─────────────────┐   ┌──▼───────┐ ┌▼──────────┐ │
//! │          └────────────│   RouteLine     │   │Receivable│ │LedgerEntry│ │
//! │                       │ sent / returned │   │ 1:1 cred.│ │ append    │ │
//! │                       └─────────────────┘   └──────────┘ └───────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity uses a UUID v4 string as its identity. Monetary columns are
//! stored as integer cents and exposed as [`Money`] through accessors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::WALK_IN_CUSTOMER_ID;

// =============================================================================
// Product
// =============================================================================

/// Lifecycle flag of a product.
///
/// Products referenced by invoices or routes are never physically removed;
/// deactivating hides them from sale-facing listings only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

/// A product held in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across the catalogue.
    pub name: String,

    /// Optional barcode (EAN-13, UPC-A, ...), unique when present.
    pub barcode: Option<String>,

    /// Last purchase cost in cents.
    pub cost_cents: i64,

    /// Catalogue sale price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative once an operation commits.
    pub stock: i64,

    pub status: ProductStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Checks whether `quantity` units can leave inventory.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// What caused a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (initial stock, manual entry, supplier purchase).
    Entry,
    /// Goods sold on an invoice.
    Sale,
    /// Goods loaded onto a delivery route.
    RouteDispatch,
    /// Route return reconciliation (positive or negative correction).
    RouteReturn,
    /// Manual correction of the counted stock.
    Adjustment,
}

/// Immutable record of a single stock change.
///
/// `quantity` is signed: positive adds stock, negative removes it.
/// `stock_after` is the product's stock right after this movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub kind: MovementKind,
    pub stock_after: i64,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer / Supplier
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// NIT.
    pub tax_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// True for the sentinel customer used on anonymous cash sales.
    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_CUSTOMER_ID
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Purchase
// =============================================================================

/// Goods bought from a supplier. Increases stock when recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub supplier_id: String,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub id: String,
    pub purchase_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

// =============================================================================
// Invoice
// =============================================================================

/// How an invoice is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Paid in full at the counter (contado).
    Cash,
    /// Sold on account; a receivable tracks the balance (crédito).
    Credit,
}

/// A completed sale. Never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Sequential human number, rendered by [`Invoice::receipt_label`].
    pub number: i64,
    pub customer_id: Option<String>,
    pub total_cents: i64,
    pub payment_kind: PaymentKind,
    /// Cash handed over by the customer (cash invoices only).
    pub cash_tendered_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Receipt label printed on tickets, e.g. `INT-0042`.
    pub fn receipt_label(&self) -> String {
        format!("INT-{:04}", self.number)
    }

    /// Change handed back on a cash sale.
    pub fn change(&self) -> Option<Money> {
        self.cash_tendered_cents
            .map(|tendered| Money::from_cents(tendered) - self.total())
    }
}

/// A line of an invoice. Unit price is frozen at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl InvoiceLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Receivable
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    /// Nothing paid yet.
    Pending,
    /// Some but not all of the balance paid.
    Partial,
    /// Balance is zero.
    Paid,
}

impl ReceivableStatus {
    /// Derives the status from the balance.
    ///
    /// `remaining == 0` is always `Paid`; an untouched balance is `Pending`.
    pub fn from_balance(total: Money, remaining: Money) -> Self {
        if remaining.is_zero() {
            ReceivableStatus::Paid
        } else if remaining == total {
            ReceivableStatus::Pending
        } else {
            ReceivableStatus::Partial
        }
    }
}

/// Outstanding balance of one credit invoice (cuenta por cobrar).
///
/// ## Invariant
/// `0 <= remaining_cents <= total_cents`, and `remaining_cents` only goes down.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id: String,
    pub customer_id: String,
    pub invoice_id: String,
    pub total_cents: i64,
    pub remaining_cents: i64,
    pub status: ReceivableStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    /// Amount collected so far (down payment included).
    #[inline]
    pub fn amount_paid(&self) -> Money {
        self.total() - self.remaining()
    }
}

// =============================================================================
// Cash Ledger
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// Money in (ingreso).
    Income,
    /// Money out (egreso).
    Expense,
}

/// Where a ledger entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOrigin {
    CashSale,
    CreditDownPayment,
    CreditPayment,
    Manual,
}

impl LedgerOrigin {
    /// Default description written when the caller gives none.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerOrigin::CashSale => "cash sale",
            LedgerOrigin::CreditDownPayment => "credit down-payment",
            LedgerOrigin::CreditPayment => "credit payment",
            LedgerOrigin::Manual => "manual entry",
        }
    }
}

/// Immutable journal line of the cash ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub kind: LedgerKind,
    /// Always > 0; the sign comes from `kind`.
    pub amount_cents: i64,
    pub origin: LedgerOrigin,
    pub description: Option<String>,
    pub invoice_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Amount with the sign of its kind (expenses negative).
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            LedgerKind::Income => self.amount(),
            LedgerKind::Expense => Money::zero() - self.amount(),
        }
    }
}

// =============================================================================
// Route
// =============================================================================

/// Descriptive header of a delivery run (hoja de ruta).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteHeader {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub driver: Option<String>,
    pub driver_license: Option<String>,
    pub vehicle_plate: Option<String>,
    pub vehicle_condition: Option<String>,
    pub destination_name: Option<String>,
    pub destination_address: Option<String>,
    pub notes: Option<String>,
}

/// A delivery run. The header is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub driver: Option<String>,
    pub driver_license: Option<String>,
    pub vehicle_plate: Option<String>,
    pub vehicle_condition: Option<String>,
    pub destination_name: Option<String>,
    pub destination_address: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn header(&self) -> RouteHeader {
        RouteHeader {
            date: self.date,
            driver: self.driver.clone(),
            driver_license: self.driver_license.clone(),
            vehicle_plate: self.vehicle_plate.clone(),
            vehicle_condition: self.vehicle_condition.clone(),
            destination_name: self.destination_name.clone(),
            destination_address: self.destination_address.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// One product on a route.
///
/// ## Invariant
/// `0 <= quantity_returned <= quantity_sent`. "Sold" is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RouteLine {
    pub id: String,
    pub route_id: String,
    pub product_id: String,
    pub quantity_sent: i64,
    pub quantity_returned: i64,
}

impl RouteLine {
    #[inline]
    pub fn sold(&self) -> i64 {
        self.quantity_sent - self.quantity_returned
    }
}

/// Reconciliation state of a route, derived from its lines.
///
/// There is no terminal flag: returns can be re-submitted at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    /// No returns recorded yet.
    Dispatched,
    /// At least one line has a recorded return.
    PartiallyReconciled,
}

impl RouteState {
    pub fn of(lines: &[RouteLine]) -> Self {
        if lines.iter().any(|l| l.quantity_returned > 0) {
            RouteState::PartiallyReconciled
        } else {
            RouteState::Dispatched
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn receivable(total: i64, remaining: i64) -> Receivable {
        let now = Utc::now();
        Receivable {
            id: "r".into(),
            customer_id: "c".into(),
            invoice_id: "i".into(),
            total_cents: total,
            remaining_cents: remaining,
            status: ReceivableStatus::from_balance(
                Money::from_cents(total),
                Money::from_cents(remaining),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_receivable_status_from_balance() {
        let total = Money::from_cents(10_000);
        assert_eq!(
            ReceivableStatus::from_balance(total, total),
            ReceivableStatus::Pending
        );
        assert_eq!(
            ReceivableStatus::from_balance(total, Money::from_cents(8_000)),
            ReceivableStatus::Partial
        );
        assert_eq!(
            ReceivableStatus::from_balance(total, Money::zero()),
            ReceivableStatus::Paid
        );
    }

    #[test]
    fn test_amount_paid() {
        let r = receivable(10_000, 8_000);
        assert_eq!(r.amount_paid().cents(), 2_000);
        assert_eq!(r.status, ReceivableStatus::Partial);
    }

    #[test]
    fn test_receipt_label_and_change() {
        let invoice = Invoice {
            id: "i".into(),
            number: 42,
            customer_id: None,
            total_cents: 1_500,
            payment_kind: PaymentKind::Cash,
            cash_tendered_cents: Some(2_000),
            created_at: Utc::now(),
        };
        assert_eq!(invoice.receipt_label(), "INT-0042");
        assert_eq!(invoice.change(), Some(Money::from_cents(500)));
    }

    #[test]
    fn test_route_state_and_sold() {
        let mut line = RouteLine {
            id: "l".into(),
            route_id: "r".into(),
            product_id: "p".into(),
            quantity_sent: 20,
            quantity_returned: 0,
        };
        assert_eq!(RouteState::of(std::slice::from_ref(&line)), RouteState::Dispatched);

        line.quantity_returned = 5;
        assert_eq!(line.sold(), 15);
        assert_eq!(RouteState::of(&[line]), RouteState::PartiallyReconciled);
    }

    #[test]
    fn test_ledger_signed_amount() {
        let entry = LedgerEntry {
            id: "e".into(),
            kind: LedgerKind::Expense,
            amount_cents: 300,
            origin: LedgerOrigin::Manual,
            description: None,
            invoice_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount().cents(), -300);
    }
}
