//! # depot-core: Pure Business Logic for Depot POS
//!
//! This crate holds every business rule of Depot POS as pure functions with
//! zero I/O dependencies. The database crate loads rows, hands them to the
//! functions here, and persists whatever they decide.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP layer / desktop shell (external)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/depot-pos (commands)                       │   │
//! │  │    create_invoice, apply_receivable_payment, create_route, ... │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │   │ invoice │ │receiv-  │ │  route   │ │ ledger │ │invent- │  │   │
//! │  │   │ pricing │ │able math│ │ returns  │ │ totals │ │ory     │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    depot-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, transactional repositories   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Invoice, Receivable, Route, ...)
//! - [`money`] - Integer-cents money type
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`inventory`] - Stock deltas and movement replay
//! - [`invoice`] - Line pricing, stock pre-checks, payment settlement
//! - [`receivable`] - Credit payment application
//! - [`ledger`] - Business-day ranges and ledger aggregation
//! - [`route`] - Return planning and route valuation
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::invoice::{settle, Settlement};
//! use depot_core::money::Money;
//! use depot_core::PaymentKind;
//!
//! let total = Money::from_cents(1500);
//! let settlement = settle(PaymentKind::Cash, total, Some(Money::from_cents(2000)), None).unwrap();
//!
//! assert_eq!(settlement, Settlement::Cash {
//!     tendered: Money::from_cents(2000),
//!     change: Money::from_cents(500),
//! });
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod receivable;
pub mod route;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed identity of the walk-in customer.
///
/// The row is inserted idempotently at startup, so every cash sale without a
/// named customer can point at the same record.
pub const WALK_IN_CUSTOMER_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Display name of the walk-in customer.
pub const WALK_IN_CUSTOMER_NAME: &str = "Mostrador";

/// Maximum quantity on a single invoice, route or purchase line.
///
/// Catches typos such as 10000 instead of 100 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Maximum number of lines accepted in one invoice, route or purchase.
pub const MAX_LINES: usize = 200;

/// Highest unit price or cost, in cents (Q1,000,000.00).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_LINES`] this bounds any invoice,
/// purchase or route total near 2 * 10^15 cents, far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest single payment, tender or ledger amount, in cents.
///
/// Covers the largest possible invoice total.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000_000;
