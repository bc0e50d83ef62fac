//! Runtime configuration, assembled from `STOREFRONT_*` environment
//! variables or built programmatically.

use std::env;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_ADMIN_PIN: &str = "1234";
pub const DEFAULT_DATA_DIR: &str = "./storefront-data";

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Hosted database base URL. Absent selects the in-memory backend.
    pub database_url: Option<String>,
    /// Optional `?auth=` token for the hosted database.
    pub auth_token: Option<String>,
    /// Device storage and log files live here.
    pub data_dir: PathBuf,
    /// Shared 4-digit admin PIN, compared in plaintext.
    pub admin_pin: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            auth_token: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
        }
    }
}

impl StorefrontConfig {
    pub fn new(
        database_url: Option<String>,
        auth_token: Option<String>,
        data_dir: impl Into<PathBuf>,
        admin_pin: impl Into<String>,
    ) -> Self {
        Self {
            database_url,
            auth_token,
            data_dir: data_dir.into(),
            admin_pin: admin_pin.into(),
        }
    }

    /// Read `STOREFRONT_DATABASE_URL`, `STOREFRONT_AUTH`,
    /// `STOREFRONT_DATA_DIR`, and `STOREFRONT_ADMIN_PIN`, falling back to
    /// defaults. Blank values count as unset.
    pub fn from_env() -> Self {
        let config = Self {
            database_url: non_empty_var("STOREFRONT_DATABASE_URL"),
            auth_token: non_empty_var("STOREFRONT_AUTH"),
            data_dir: non_empty_var("STOREFRONT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            admin_pin: non_empty_var("STOREFRONT_ADMIN_PIN")
                .unwrap_or_else(|| DEFAULT_ADMIN_PIN.to_string()),
        };
        info!(
            data_dir = %config.data_dir.display(),
            remote = config.database_url.is_some(),
            "configuration loaded"
        );
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_storefront_env() {
        env::remove_var("STOREFRONT_DATABASE_URL");
        env::remove_var("STOREFRONT_AUTH");
        env::remove_var("STOREFRONT_DATA_DIR");
        env::remove_var("STOREFRONT_ADMIN_PIN");
    }

    #[test]
    #[serial]
    fn from_env_defaults_when_unset() {
        clear_storefront_env();
        let config = StorefrontConfig::from_env();
        assert!(config.database_url.is_none());
        assert!(config.auth_token.is_none());
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.admin_pin, DEFAULT_ADMIN_PIN);
    }

    #[test]
    #[serial]
    fn from_env_reads_all_variables() {
        clear_storefront_env();
        env::set_var("STOREFRONT_DATABASE_URL", "https://db.example.com");
        env::set_var("STOREFRONT_AUTH", "secret-token");
        env::set_var("STOREFRONT_DATA_DIR", "/tmp/storefront");
        env::set_var("STOREFRONT_ADMIN_PIN", "4321");

        let config = StorefrontConfig::from_env();
        assert_eq!(
            config.database_url.as_deref(),
            Some("https://db.example.com")
        );
        assert_eq!(config.auth_token.as_deref(), Some("secret-token"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/storefront"));
        assert_eq!(config.admin_pin, "4321");

        clear_storefront_env();
    }

    #[test]
    #[serial]
    fn blank_values_count_as_unset() {
        clear_storefront_env();
        env::set_var("STOREFRONT_DATABASE_URL", "   ");
        env::set_var("STOREFRONT_ADMIN_PIN", "");

        let config = StorefrontConfig::from_env();
        assert!(config.database_url.is_none());
        assert_eq!(config.admin_pin, DEFAULT_ADMIN_PIN);

        clear_storefront_env();
    }
}
