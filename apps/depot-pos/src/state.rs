//! # Application State
//!
//! Everything a command needs: the database handle and the configuration.
//! Both are cheap to clone and read-only after startup.

use depot_db::{Database, DbConfig};
use tracing::info;

use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    /// Opens the configured database (migrations + walk-in customer).
    pub async fn open(config: AppConfig) -> Result<Self, ApiError> {
        let path = config.database_path()?;
        info!(path = %path.display(), "Opening store database");

        let db = Database::new(DbConfig::new(path)).await?;
        Ok(AppState { db, config })
    }

    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState { db, config }
    }
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = AppConfig {
        store_name: "Abarroteria Central".to_string(),
        store_tax_id: Some("1234567-8".to_string()),
        utc_offset_minutes: 0,
        ..AppConfig::default()
    };
    AppState::new(db, config)
}
