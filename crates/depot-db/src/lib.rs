//! # depot-db: Database Layer for Depot POS
//!
//! SQLite persistence for the store: one database file, one pool, one
//! transaction per operation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot POS Data Flow                              │
//! │                                                                         │
//! │  depot-pos command (create_invoice)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ RouteRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ LedgerRepo    │    │ ...          │  │   │
//! │  │   │ Management    │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ plans from depot-core         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/depot.db")).await?;
//! let products = db.products().list_for_sale("aceite", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::{CustomerInput, CustomerRepository};
pub use repository::inventory::{InventoryRepository, MovementView};
pub use repository::invoice::{
    CreatedInvoice, InvoiceDetail, InvoiceLineView, InvoiceRepository, InvoiceSummary,
};
pub use repository::ledger::LedgerRepository;
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::purchase::{PurchaseDetail, PurchaseLineRequest, PurchaseRepository};
pub use repository::receivable::{
    AppliedPayment, ReceivableFilter, ReceivableRepository, ReceivableView,
};
pub use repository::route::{RouteDetail, RouteLineView, RouteRepository, RouteSummary};
pub use repository::supplier::{NewSupplier, SupplierRepository};
