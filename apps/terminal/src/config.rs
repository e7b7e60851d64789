//! # Terminal Configuration
//!
//! Settings loaded once at startup and read-only afterwards.
//!
//! ## Sources (later wins)
//! 1. Defaults (this file)
//! 2. `till.toml` (explicit path, else the platform config dir)
//! 3. Environment variables (`TILL_*`)
//!
//! The merged result is validated before the terminal opens the database.
//!
//! ## Example `till.toml`
//! ```toml
//! [store]
//! name = "Corner Mart"
//! operator = "Ayesha"
//!
//! [pricing]
//! tax_rate_bps = 1500
//! tax_enabled_by_default = true
//!
//! [catalog]
//! search_limit = 20
//! page_size = 16
//!
//! [database]
//! path = "/var/lib/till/till.db"
//! max_connections = 5
//! acquire_timeout_secs = 30
//! idle_timeout_secs = 600   # 0 keeps idle connections open
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use till_core::validation::validate_tax_rate_bps;
use till_core::{TaxRate, DEFAULT_OPERATOR, DEFAULT_TAX_RATE_BPS};
use till_db::DbConfig;

/// File name looked up in the platform config dir.
pub const CONFIG_FILE_NAME: &str = "till.toml";

const DB_FILE_NAME: &str = "till.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub store: StoreConfig,
    pub pricing: PricingConfig,
    pub catalog: CatalogConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Shown in the session banner.
    pub name: String,
    /// Recorded as cashier on sales and as `created_by` on ledger rows.
    pub operator: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: "Till POS".to_string(),
            operator: DEFAULT_OPERATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Basis points, 1500 = 15%.
    pub tax_rate_bps: u32,
    pub tax_enabled_by_default: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            tax_enabled_by_default: true,
        }
    }
}

impl PricingConfig {
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub search_limit: u32,
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            search_limit: 20,
            page_size: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `None` means `till.db` in the platform data dir.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    /// How long a command waits for a free connection.
    pub acquire_timeout_secs: u64,
    /// 0 never closes idle connections.
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl DatabaseConfig {
    fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl TerminalConfig {
    /// Loads defaults, then the config file, then `TILL_*` variables.
    ///
    /// With no explicit path a missing file in the config dir is not an
    /// error; an explicit path that cannot be read is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => TerminalConfig::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies environment overrides through `lookup`.
    ///
    /// ## Variables
    /// - `TILL_DB_PATH`: database file
    /// - `TILL_TAX_RATE`: percent, e.g. `15` or `17.5`
    /// - `TILL_STORE_NAME`: store name
    /// - `TILL_OPERATOR`: cashier name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TILL_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(rate) = lookup("TILL_TAX_RATE") {
            self.pricing.tax_rate_bps = percent_to_bps(&rate)?;
        }

        if let Some(name) = lookup("TILL_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(operator) = lookup("TILL_OPERATOR") {
            self.store.operator = operator;
        }

        Ok(())
    }

    /// Checks ranges after all sources are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tax_rate_bps(self.pricing.tax_rate_bps)
            .map_err(|e| ConfigError::invalid("pricing.tax_rate_bps", e.to_string()))?;

        if self.store.operator.trim().is_empty() {
            return Err(ConfigError::invalid("store.operator", "cannot be empty"));
        }

        if self.catalog.search_limit == 0 {
            return Err(ConfigError::invalid("catalog.search_limit", "must be at least 1"));
        }

        if self.catalog.page_size == 0 {
            return Err(ConfigError::invalid("catalog.page_size", "must be at least 1"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be at least 1",
            ));
        }

        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "database.acquire_timeout_secs",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Resolves the database file, creating the data dir when defaulted.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DB_FILE_NAME))
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .acquire_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
            .idle_timeout(self.database.idle_timeout()))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "till", "pos")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn percent_to_bps(raw: &str) -> Result<u32, ConfigError> {
    let pct = Decimal::from_str(raw.trim())
        .map_err(|_| ConfigError::invalid("TILL_TAX_RATE", format!("'{}' is not a number", raw)))?;

    let bps = pct * Decimal::ONE_HUNDRED;
    if bps.fract() != Decimal::ZERO {
        return Err(ConfigError::invalid(
            "TILL_TAX_RATE",
            "at most two decimal places",
        ));
    }

    bps.to_u32()
        .ok_or_else(|| ConfigError::invalid("TILL_TAX_RATE", "must be between 0 and 100"))
}
