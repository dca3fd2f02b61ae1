//! # Depot POS Application Library
//!
//! The operation surface of the store. A transport (HTTP routes, desktop IPC)
//! maps one request to one command function; this crate owns startup,
//! configuration and the error shape callers see.
//!
//! ## Module Organization
//! ```text
//! depot_pos/
//! ├── lib.rs          ◄─── You are here (tracing + startup)
//! ├── config.rs       ◄─── AppConfig from DEPOT_* variables
//! ├── state.rs        ◄─── AppState { Database, AppConfig }
//! ├── error.rs        ◄─── ApiError { code, message }
//! └── commands/
//!     ├── product.rs  inventory.rs  customer.rs  purchase.rs
//!     ├── invoice.rs  receivable.rs ledger.rs    route.rs
//!     └── document.rs
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()       RUST_LOG or "info,depot=debug,sqlx=warn"       │
//! │  2. AppConfig::from_env  DEPOT_* over defaults                          │
//! │  3. database_path()      DEPOT_DB_PATH or the platform data dir         │
//! │  4. Database::new        WAL, foreign keys, migrations, walk-in row     │
//! │  5. AppState             handed to every command                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use error::ApiError;
use state::AppState;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=depot=trace` - Show trace for depot crates only
/// - Default: `info,depot=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads configuration from the environment and opens the store database.
pub async fn startup() -> Result<AppState, ApiError> {
    let config = AppConfig::from_env();
    info!(store = %config.store_name, offset_minutes = config.utc_offset_minutes, "Starting Depot POS");

    let state = AppState::open(config).await?;
    info!("Database connected and migrations applied");
    Ok(state)
}
