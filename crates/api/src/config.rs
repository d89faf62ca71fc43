//! Application configuration loaded from environment variables.

use domain::{COLLECTION, FlagField};
use manager::ManagerConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `FLAGS_COLLECTION`: collection API name (default: `"Feature_Flag__c"`)
/// - `FLAGS_LIST_VIEW`: list view API name (default: `"All"`)
/// - `FLAGS_PAGE_SIZE`: rows fetched per refresh (default: `10`)
/// - `FLAGS_SORT_FIELD`: field API name to sort by (default: `"Name"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub collection: String,
    pub list_view: String,
    pub page_size: u32,
    pub sort_field: FlagField,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            collection: lookup("FLAGS_COLLECTION").unwrap_or(defaults.collection),
            list_view: lookup("FLAGS_LIST_VIEW").unwrap_or(defaults.list_view),
            page_size: lookup("FLAGS_PAGE_SIZE")
                .and_then(|p| p.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            sort_field: lookup("FLAGS_SORT_FIELD")
                .and_then(|f| FlagField::from_api_name(&f))
                .unwrap_or(defaults.sort_field),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the reader/writer settings for the flag manager.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            collection: self.collection.clone(),
            list_view: self.list_view.clone(),
            page_size: self.page_size,
            sort_field: self.sort_field,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            collection: COLLECTION.to_string(),
            list_view: "All".to_string(),
            page_size: 10,
            sort_field: FlagField::Name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.collection, "Feature_Flag__c");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.sort_field, FlagField::Name);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("FLAGS_PAGE_SIZE", "25"),
            ("FLAGS_SORT_FIELD", "Percentage_Rollout__c"),
            ("FLAGS_LIST_VIEW", "All"),
        ]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.sort_field, FlagField::PercentageRollout);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("FLAGS_PAGE_SIZE", "0"),
            ("FLAGS_SORT_FIELD", "Owner"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.sort_field, FlagField::Name);
    }

    #[test]
    fn test_manager_config() {
        let config = Config {
            page_size: 5,
            ..Config::default()
        };
        let manager_config = config.manager_config();
        assert_eq!(manager_config.page_size, 5);
        assert_eq!(manager_config.collection, "Feature_Flag__c");
    }
}
