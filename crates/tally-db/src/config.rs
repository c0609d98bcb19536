//! # Tally Configuration
//!
//! Tenant, VAT and database settings for the services and the CLI.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_TENANT_ID=...        TALLY_DATABASE_PATH=/var/lib/tally.db   │
//! │     TALLY_CASH_ROUNDING=false  TALLY_VAT_LOW=9                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ./tally.toml, or the path given with --config                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     default tenant, tally.db, VAT 0/9/21, cash rounding on             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! [tenant]
//! id = "00000000-0000-0000-0000-000000000001"
//! cash_rounding = true
//!
//! [vat]
//! zero = 0
//! low = 9
//! high = 21
//!
//! [database]
//! path = "tally.db"
//! max_connections = 5
//! ```
//!
//! A tier can only be switched off from the environment, by setting its
//! variable to an empty string.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;
use tally_core::settings::{EngineSettings, VatTiers};
use tally_core::DEFAULT_TENANT_ID;

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tally.toml";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Tenant UUID every repository is scoped to.
    pub id: String,

    /// Round cash-only change to 0.05.
    pub cash_rounding: bool,
}

impl Default for TenantConfig {
    fn default() -> Self {
        TenantConfig {
            id: DEFAULT_TENANT_ID.to_string(),
            cash_rounding: true,
        }
    }
}

/// VAT tier percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VatConfig {
    pub zero: Option<Decimal>,
    pub low: Option<Decimal>,
    pub high: Option<Decimal>,
}

impl Default for VatConfig {
    fn default() -> Self {
        let tiers = EngineSettings::default().vat;
        VatConfig {
            zero: tiers.zero,
            low: tiers.low,
            high: tiers.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,

    /// Default: 5
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: PathBuf::from("tally.db"),
            max_connections: 5,
        }
    }
}

// =============================================================================
// Tally Config
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub tenant: TenantConfig,
    pub vat: VatConfig,
    pub database: DatabaseConfig,
}

impl TallyConfig {
    /// Loads configuration from the file (if present) and the environment.
    ///
    /// An explicitly given path that doesn't exist is an error; a missing
    /// default file just means defaults.
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let explicit = config_path.is_some();
        let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            info!(?path, "Loading config from file");
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                DbError::invalid_config(format!("cannot read {}: {e}", path.display()))
            })?;
            Self::from_toml_str(&contents)?
        } else if explicit {
            return Err(DbError::invalid_config(format!(
                "config file not found: {}",
                path.display()
            )));
        } else {
            debug!(?path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; sections and keys left out keep their defaults.
    pub fn from_toml_str(contents: &str) -> DbResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> DbResult<()> {
        if let Some(id) = lookup("TALLY_TENANT_ID") {
            debug!(tenant = %id, "Overriding tenant from environment");
            self.tenant.id = id;
        }

        if let Some(path) = lookup("TALLY_DATABASE_PATH") {
            debug!(%path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = lookup("TALLY_CASH_ROUNDING") {
            self.tenant.cash_rounding = match value.trim().to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                other => {
                    return Err(DbError::invalid_config(format!(
                        "TALLY_CASH_ROUNDING must be true, false, 1 or 0, got '{other}'"
                    )))
                }
            };
        }

        for (key, slot) in [
            ("TALLY_VAT_ZERO", &mut self.vat.zero),
            ("TALLY_VAT_LOW", &mut self.vat.low),
            ("TALLY_VAT_HIGH", &mut self.vat.high),
        ] {
            if let Some(value) = lookup(key) {
                *slot = parse_tier(key, &value)?;
            }
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        if Uuid::parse_str(&self.tenant.id).is_err() {
            return Err(DbError::invalid_config(format!(
                "tenant id must be a UUID, got '{}'",
                self.tenant.id
            )));
        }

        if self.database.max_connections == 0 {
            return Err(DbError::invalid_config(
                "max_connections must be greater than 0",
            ));
        }

        self.engine_settings()
            .validate()
            .map_err(|e| DbError::invalid_config(e.to_string()))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tenant_id(&self) -> &str {
        &self.tenant.id
    }

    /// Calculation context for this tenant.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::default()
            .with_vat(VatTiers {
                zero: self.vat.zero,
                low: self.vat.low,
                high: self.vat.high,
            })
            .with_cash_rounding(self.tenant.cash_rounding)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

fn parse_tier(key: &str, value: &str) -> DbResult<Option<Decimal>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(value)
        .map(Some)
        .map_err(|e| DbError::invalid_config(format!("{key}: '{value}' is not a number ({e})")))
}
