//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with TIPLINE_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the backend service key should be kept in environment
//! variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Tipline".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address and port to bind, e.g. "0.0.0.0:8080"
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Managed backend (PostgREST table + object storage bucket) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Service endpoint URL, e.g. "https://myproject.supabase.co"
    pub url: String,
    /// Service key (should be in env var TIPLINE_BACKEND_KEY)
    #[serde(default)]
    pub key: String,
    /// Storage bucket for report images
    pub bucket: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            bucket: "report-images".to_string(),
        }
    }
}

/// A staff account able to use the moderation panel.
///
/// `password_hash` is an argon2 PHC string produced by the `hash-password`
/// binary. Accounts with `is_staff = false` can authenticate but are never
/// admitted to moderation routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffAccount {
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub staff: Vec<StaffAccount>,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (TIPLINE_ prefix)
            // e.g., TIPLINE_BACKEND_URL, TIPLINE_SERVER_BIND
            .add_source(
                Environment::with_prefix("TIPLINE")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file.
    ///
    /// A changed backend endpoint takes effect on the next request because
    /// the store handle is keyed by the configured URL.
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        replace(new_config);
        log::info!("Configuration reloaded");
        Ok(())
    }
}

/// Swap in a new configuration. Used by `reload` and by tests.
pub fn replace(new_config: AppConfig) {
    if let Ok(mut config) = APP_CONFIG.write() {
        *config = new_config;
    }
}

/// Initialize application configuration
///
/// This triggers the lazy loading of the config file and logs the result.
/// Should be called early in application startup.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: site.name = {}, {} staff account(s)",
        config.site.name,
        config.staff.len()
    );
}

// Convenience functions for accessing global config

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

/// Get site configuration
pub fn site() -> SiteConfig {
    get_config().site
}

/// Get server configuration
pub fn server() -> ServerConfig {
    get_config().server
}

/// Get backend configuration
pub fn backend() -> BackendConfig {
    get_config().backend
}

/// Get the configured staff accounts
pub fn staff() -> Vec<StaffAccount> {
    get_config().staff
}
