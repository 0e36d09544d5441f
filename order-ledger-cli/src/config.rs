//! Application configuration
//!
//! Loaded from a TOML file. The default location is
//! `<config_dir>/order-ledger/config.toml`; when that file does not exist the
//! built-in defaults apply. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

const APP_DIR: &str = "order-ledger";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Workbook tried before prompting for a path
    pub default_file: Option<PathBuf>,
    pub sheets: SheetMarkers,
    pub display: DisplayConfig,
}

/// Substrings that identify each sheet kind by name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetMarkers {
    pub products: String,
    pub customers: String,
    pub orders: String,
}

impl Default for SheetMarkers {
    fn default() -> Self {
        Self {
            products: "Товары".to_string(),
            customers: "Клиенты".to_string(),
            orders: "Заявки".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// chrono strftime pattern for order dates
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%d.%m.%Y".to_string(),
        }
    }
}

impl Config {
    /// Default config file path, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from an explicit path, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (kind, marker) in [
            ("products", &self.sheets.products),
            ("customers", &self.sheets.customers),
            ("orders", &self.sheets.orders),
        ] {
            if marker.trim().is_empty() {
                bail!("Sheet marker for {} must not be empty", kind);
            }
        }

        if StrftimeItems::new(&self.display.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("Invalid date format: '{}'", self.display.date_format);
        }

        Ok(())
    }
}
