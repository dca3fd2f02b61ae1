//! # Commands
//!
//! One async function per store operation. Every command takes the
//! [`AppState`](crate::state::AppState), camelCase request types, and
//! returns `Result<T, ApiError>`. A transport (HTTP, desktop IPC) maps them
//! one-to-one.
//!
//! ```text
//! commands/
//! ├── product.rs     catalogue search and administration
//! ├── inventory.rs   stock entries, movement history
//! ├── customer.rs    customers
//! ├── purchase.rs    suppliers and purchases
//! ├── invoice.rs     create_invoice, invoice queries
//! ├── receivable.rs  apply_receivable_payment, list_receivables
//! ├── ledger.rs      manual entries, summarize_ledger (cierre de caja)
//! ├── route.rs       create_route, record_route_returns, compute_route_value
//! └── document.rs    data for the invoice and route-sheet renderer
//! ```

pub mod customer;
pub mod document;
pub mod inventory;
pub mod invoice;
pub mod ledger;
pub mod product;
pub mod purchase;
pub mod receivable;
pub mod route;
