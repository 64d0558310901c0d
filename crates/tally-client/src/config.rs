//! # Client Configuration
//!
//! Configuration for the backend client and checkout.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_API_URL=https://pos.example.com/api                          │
//! │     TALLY_SUBMIT_TIMEOUT_SECS=20                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/client.toml (Linux)                            │
//! │     ~/Library/Application Support/com.tally.pos/client.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost API, 15s submit timeout, cash payments                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! base_url = "https://pos.example.com/api"
//! submit_timeout_secs = 15
//! connect_timeout_secs = 5
//! inventory_timeout_secs = 20
//!
//! [sale]
//! payment_method = "cash"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tally_core::PaymentMethod;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the backend lives and how long we wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths such as `/customer/sell` are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on a sale submission, end to end (seconds).
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on the stock list fetch (seconds).
    #[serde(default = "default_inventory_timeout")]
    pub inventory_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_submit_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_inventory_timeout() -> u64 {
    20
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            submit_timeout_secs: default_submit_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            inventory_timeout_secs: default_inventory_timeout(),
        }
    }
}

// =============================================================================
// Sale Settings
// =============================================================================

/// Defaults applied to every sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Tender recorded with each sale.
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub sale: SaleSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        for (name, value) in [
            ("submit_timeout_secs", self.api.submit_timeout_secs),
            ("connect_timeout_secs", self.api.connect_timeout_secs),
            ("inventory_timeout_secs", self.api.inventory_timeout_secs),
        ] {
            if value == 0 {
                return Err(ClientError::InvalidConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TALLY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(secs) = std::env::var("TALLY_SUBMIT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.submit_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid TALLY_SUBMIT_TIMEOUT_SECS"),
            }
        }

        if let Ok(secs) = std::env::var("TALLY_CONNECT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.connect_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid TALLY_CONNECT_TIMEOUT_SECS"),
            }
        }

        if let Ok(method) = std::env::var("TALLY_PAYMENT_METHOD") {
            match method.parse::<PaymentMethod>() {
                Ok(parsed) => {
                    debug!(payment_method = %parsed, "Overriding payment method from environment");
                    self.sale.payment_method = parsed;
                }
                Err(e) => warn!(error = %e, "Unknown payment method in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.api.submit_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }

    pub fn inventory_timeout(&self) -> Duration {
        Duration::from_secs(self.api.inventory_timeout_secs)
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.sale.payment_method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.submit_timeout_secs, 15);
        assert_eq!(config.payment_method(), PaymentMethod::Cash);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ws://localhost:8080".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://pos.example.com/api".to_string();
        assert!(config.validate().is_ok());

        config.api.submit_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://pos.example.com/api"

            [sale]
            payment_method = "card"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://pos.example.com/api");
        assert_eq!(config.api.connect_timeout_secs, 5);
        assert_eq!(config.payment_method(), PaymentMethod::Card);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = std::env::temp_dir().join(format!("tally-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("client.toml");

        let mut config = ClientConfig::default();
        config.api.inventory_timeout_secs = 42;
        config.save(Some(path.clone())).unwrap();

        let loaded = ClientConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.api.inventory_timeout_secs, 42);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[sale]"));
        assert!(toml_str.contains("payment_method = \"cash\""));
    }
}
