//! # Application Configuration
//!
//! Read once at startup from `DEPOT_*` environment variables over the
//! defaults below. Read-only afterwards, so no lock.
//!
//! | Variable                   | Default                          |
//! |----------------------------|----------------------------------|
//! | `DEPOT_DB_PATH`            | platform data dir / `depot.db`   |
//! | `DEPOT_STORE_NAME`         | `Depot`                          |
//! | `DEPOT_STORE_ADDRESS`      | (none)                           |
//! | `DEPOT_STORE_TAX_ID`       | (none)                           |
//! | `DEPOT_CURRENCY_SYMBOL`    | `Q`                              |
//! | `DEPOT_UTC_OFFSET_MINUTES` | local offset of the machine      |

use std::path::PathBuf;

use chrono::{FixedOffset, Local, Offset, Utc};
use directories::ProjectDirs;
use serde::Serialize;
use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Printed on invoices and route sheets.
    pub store_name: String,
    pub store_address: Option<String>,
    pub store_tax_id: Option<String>,

    pub currency_symbol: String,

    /// Offset of the store's business day from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: None,
            store_name: "Depot".to_string(),
            store_address: None,
            store_tax_id: None,
            currency_symbol: "Q".to_string(),
            utc_offset_minutes: Local::now().offset().fix().local_minus_utc() / 60,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by whatever `DEPOT_*` variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = get("DEPOT_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(name) = get("DEPOT_STORE_NAME") {
            config.store_name = name;
        }
        config.store_address = get("DEPOT_STORE_ADDRESS");
        config.store_tax_id = get("DEPOT_STORE_TAX_ID");
        if let Some(symbol) = get("DEPOT_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }
        if let Some(raw) = get("DEPOT_UTC_OFFSET_MINUTES") {
            match raw.parse::<i32>() {
                Ok(minutes) if FixedOffset::east_opt(minutes * 60).is_some() => {
                    config.utc_offset_minutes = minutes;
                }
                _ => warn!(value = %raw, "Ignoring invalid DEPOT_UTC_OFFSET_MINUTES"),
            }
        }

        config
    }

    /// The store's UTC offset. Falls back to UTC if out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    /// Resolves the database file, creating its directory if needed.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.depot.pos/depot.db`
    /// - **Windows**: `%APPDATA%\depot\pos\data\depot.db`
    /// - **Linux**: `~/.local/share/pos/depot.db`
    pub fn database_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "depot", "pos")
            .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            tracing::error!(error = %e, "Failed to create data directory");
            ApiError::internal("Could not create app data directory")
        })?;

        Ok(data_dir.join("depot.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.store_name, "Depot");
        assert_eq!(config.currency_symbol, "Q");
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DEPOT_DB_PATH", "/tmp/depot-test.db"),
            ("DEPOT_STORE_NAME", "Abarroteria Central"),
            ("DEPOT_STORE_TAX_ID", " 1234567-8 "),
            ("DEPOT_CURRENCY_SYMBOL", "$"),
            ("DEPOT_UTC_OFFSET_MINUTES", "-360"),
        ]));

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/depot-test.db")));
        assert_eq!(config.store_name, "Abarroteria Central");
        assert_eq!(config.store_tax_id.as_deref(), Some("1234567-8"));
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.offset().local_minus_utc(), -6 * 3600);
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/depot-test.db")
        );
    }

    #[test]
    fn test_invalid_offset_ignored() {
        let default = AppConfig::default().utc_offset_minutes;
        let config = AppConfig::from_lookup(lookup(&[("DEPOT_UTC_OFFSET_MINUTES", "abc")]));
        assert_eq!(config.utc_offset_minutes, default);

        let config = AppConfig::from_lookup(lookup(&[("DEPOT_UTC_OFFSET_MINUTES", "100000")]));
        assert_eq!(config.utc_offset_minutes, default);
    }
}
