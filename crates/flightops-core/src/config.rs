//! Configuration management for flightops.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/flightops/config.toml`
//! - **Windows**: `%APPDATA%\flightops\config.toml`
//!
//! Every field has a compiled-in default, so a missing file is a valid
//! configuration.
//!
//! # Example
//!
//! ```ignore
//! use flightops_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("store.endpoint", "http://localhost:8000")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "flightops";

/// Default store region.
pub const DEFAULT_REGION: &str = "eu-central-1";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Table names
    #[serde(default)]
    pub tables: TableNames,
}

/// Store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Region the tables live in
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint URL; derived from the region when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Value sent verbatim as the `Authorization` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// Names of the tables the servers read and write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub flights: String,
    pub passengers: String,
    pub bookings: String,
    pub delay_notifications: String,
    pub rebooking_options: String,
    pub support_sessions: String,
    pub passenger_preferences: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            authorization: None,
        }
    }
}

impl StoreConfig {
    /// Endpoint to send requests to.
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://dynamodb.{}.amazonaws.com", self.region))
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            flights: "Flights".to_string(),
            passengers: "Passengers".to_string(),
            bookings: "Bookings".to_string(),
            delay_notifications: "DelayNotifications".to_string(),
            rebooking_options: "RebookingOptions".to_string(),
            support_sessions: "CustomerSupportSessions".to_string(),
            passenger_preferences: "PassengerPreferences".to_string(),
        }
    }
}

impl TableNames {
    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        match field {
            "flights" => Some(&mut self.flights),
            "passengers" => Some(&mut self.passengers),
            "bookings" => Some(&mut self.bookings),
            "delay_notifications" => Some(&mut self.delay_notifications),
            "rebooking_options" => Some(&mut self.rebooking_options),
            "support_sessions" => Some(&mut self.support_sessions),
            "passenger_preferences" => Some(&mut self.passenger_preferences),
            _ => None,
        }
    }
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns the default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns the default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `store.region`, `tables.flights`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "store" => match field {
                "region" => self.store.region = value.to_string(),
                "endpoint" | "url" => self.store.endpoint = Some(value.to_string()),
                "authorization" => self.store.authorization = Some(value.to_string()),
                _ => {
                    return Err(Error::Config(format!(
                        "Unknown store config field: {}",
                        field
                    )))
                }
            },
            "tables" => {
                let slot = self.tables.field_mut(field).ok_or_else(|| {
                    Error::Config(format!("Unknown table config field: {}", field))
                })?;
                *slot = value.to_string();
            }
            _ => return Err(Error::Config(format!("Unknown section: {}", section))),
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `store.region`, `tables.flights`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "store" => match field {
                "region" => Ok(Some(self.store.region.clone())),
                "endpoint" | "url" => Ok(self.store.endpoint.clone()),
                "authorization" => Ok(self.store.authorization.clone()),
                _ => Err(Error::Config(format!(
                    "Unknown store config field: {}",
                    field
                ))),
            },
            "tables" => {
                let mut tables = self.tables.clone();
                let value = tables.field_mut(field).map(|name| name.clone());
                value
                    .map(Some)
                    .ok_or_else(|| Error::Config(format!("Unknown table config field: {}", field)))
            }
            _ => Err(Error::Config(format!("Unknown section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================
