//! # Repository Module
//!
//! Database repository implementations for Depot POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command                                                               │
//! │       │  db.invoices().create(&request)                                │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │       │  1. load rows inside a transaction                             │
//! │       │  2. ask depot-core for a plan (pure, may reject)               │
//! │       │  3. write the plan: rows + stock movements + ledger            │
//! │       │  4. commit (or drop the transaction = rollback)                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is only ever changed through [`inventory::apply_movement`], which
//! pairs the conditional stock update with its movement row.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalogue and stock counts
//! - [`InventoryRepository`](inventory::InventoryRepository) - Entries and movement history
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and the walk-in sentinel
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Supplier purchases
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Cash and credit invoices
//! - [`ReceivableRepository`](receivable::ReceivableRepository) - Credit balances and payments
//! - [`LedgerRepository`](ledger::LedgerRepository) - Cash ledger and closing report
//! - [`RouteRepository`](route::RouteRepository) - Delivery routes and returns

pub mod customer;
pub mod inventory;
pub mod invoice;
pub mod ledger;
pub mod product;
pub mod purchase;
pub mod receivable;
pub mod route;
pub mod supplier;

/// Transaction handle shared by the write paths.
pub type Tx<'c> = sqlx::Transaction<'c, sqlx::Sqlite>;

/// Fresh UUID v4 identity.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
