//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: TODO_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/todo-actions/config.toml
//! 4. Default values
//!
//! The store URL is normally supplied per invocation (`cloudanturl`). The
//! `store.url` and `store.public_host` settings only provide bound defaults
//! for the local server, the same way a serverless package binds default
//! parameters to its actions.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::params::{keys, Params};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Port the local server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database holding the todo documents
    #[serde(default = "default_database")]
    pub database: String,

    /// Default store URL bound to every invocation
    #[serde(default)]
    pub url: Option<String>,

    /// Default public host used to build todo URLs
    #[serde(default)]
    pub public_host: Option<String>,

    /// Per-request timeout against the store in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Pause before a bulk write, in milliseconds
    #[serde(default = "default_bulk_write_delay_ms")]
    pub bulk_write_delay_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bulk_write_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_write_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            port: default_port(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            url: None,
            public_host: None,
            timeout_secs: default_timeout(),
            bulk_write_delay_ms: default_bulk_write_delay_ms(),
        }
    }
}

// Default value functions
fn default_service_name() -> String {
    "todo-actions".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_database() -> String {
    "todos".to_string()
}

fn default_bulk_write_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later merges win
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("TODO_").split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path; environment variables still override.
    pub fn load_from(path: &str) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TODO_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Config file locations, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("todo-actions");
        if let Ok(path) = xdg_dirs.place_config_file("config.toml") {
            paths.push(path);
        }

        paths
    }

    /// Parameters bound to every invocation made through the local server
    pub fn bound_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(ref url) = self.store.url {
            params.insert(keys::STORE_URL.to_string(), Value::String(url.clone()));
        }
        if let Some(ref host) = self.store.public_host {
            params.insert(keys::HOST.to_string(), Value::String(host.clone()));
        }
        params
    }
}
