//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod crypto;
pub mod database;
pub mod logging;
pub mod scanner;
pub mod storage;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::crypto::CryptoConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::scanner::ScannerConfig;
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog database settings.
    pub database: DatabaseConfig,
    /// Physical document tree settings.
    pub storage: StorageConfig,
    /// At-rest encryption settings.
    pub crypto: CryptoConfig,
    /// Reconciliation scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `DOCVAULT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        Self::finish(builder)
    }

    /// Load configuration from one explicit file plus environment variables.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(true));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("DOCVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_defaults() {
        let dir = std::env::temp_dir().join(format!("docvault-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[database]
url = "sqlite://catalog.db"

[storage]
root_path = "./documents"

[crypto]
key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert!(config.scanner.enabled);
        assert_eq!(config.scanner.default_category, "General");
        assert!(config.scanner.skip_directories.iter().any(|d| d == ".git"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.crypto.key_bytes().unwrap(), [0u8; 32]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
