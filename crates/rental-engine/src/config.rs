//! # Engine Configuration
//!
//! Reservation policy, deletion budgets and database location.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RENTAL_LEAD_TIME_DAYS=45                                           │
//! │     RENTAL_ACTIVE_STATUSES=PENDING,IN_PROGRESS,COMPLETED               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/engine/engine.toml (Linux)                               │
//! │     ~/Library/Application Support/com.rental.engine/engine.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     PENDING + IN_PROGRESS active, 30-day exemption, 5s/10s budgets     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [availability]
//! lead_time_exemption_enabled = true
//! lead_time_exemption_days = 30
//! active_statuses = ["PENDING", "IN_PROGRESS"]
//! max_calendar_days = 366
//!
//! [deletion]
//! max_wait_ms = 5000
//! timeout_ms = 10000
//!
//! [database]
//! path = "./rental.db"
//! max_connections = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use rental_core::{
    OrderStatus, ReservationPolicy, DEFAULT_LEAD_TIME_EXEMPTION_DAYS, MAX_CALENDAR_DAYS,
};
use rental_db::DbConfig;

use crate::store::TransactionBudget;

// =============================================================================
// Config Error
// =============================================================================

/// Failures while loading or validating [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but makes no sense.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Availability Settings
// =============================================================================

/// Reservation policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySettings {
    /// Turns the lead-time exemption on or off.
    #[serde(default = "default_true")]
    pub lead_time_exemption_enabled: bool,

    /// Bookings starting strictly more than this many days out are always
    /// available.
    #[serde(default = "default_lead_time_days")]
    pub lead_time_exemption_days: u32,

    /// Order statuses whose items hold stock.
    #[serde(default = "default_active_statuses")]
    pub active_statuses: Vec<OrderStatus>,

    /// Longest calendar a single request may ask for.
    #[serde(default = "default_max_calendar_days")]
    pub max_calendar_days: u32,
}

fn default_true() -> bool {
    true
}

fn default_lead_time_days() -> u32 {
    DEFAULT_LEAD_TIME_EXEMPTION_DAYS
}

fn default_active_statuses() -> Vec<OrderStatus> {
    ReservationPolicy::default().active_statuses
}

fn default_max_calendar_days() -> u32 {
    MAX_CALENDAR_DAYS
}

impl Default for AvailabilitySettings {
    fn default() -> Self {
        AvailabilitySettings {
            lead_time_exemption_enabled: true,
            lead_time_exemption_days: default_lead_time_days(),
            active_statuses: default_active_statuses(),
            max_calendar_days: default_max_calendar_days(),
        }
    }
}

// =============================================================================
// Deletion Settings
// =============================================================================

/// Hard-delete transaction budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionSettings {
    /// How long to wait for a connection before giving up (milliseconds).
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u64,

    /// How long the delete transaction may run (milliseconds).
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_max_wait() -> u64 {
    5_000
}

fn default_timeout() -> u64 {
    10_000
}

impl Default for DeletionSettings {
    fn default() -> Self {
        DeletionSettings {
            max_wait_ms: default_max_wait(),
            timeout_ms: default_timeout(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./rental.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub availability: AvailabilitySettings,

    #[serde(default)]
    pub deletion: DeletionSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections fall back to defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let availability = &self.availability;

        if availability.active_statuses.is_empty() {
            return Err(ConfigError::Invalid(
                "active_statuses must name at least one order status".into(),
            ));
        }

        if availability
            .active_statuses
            .contains(&OrderStatus::Cancelled)
        {
            return Err(ConfigError::Invalid(
                "CANCELLED orders cannot hold stock".into(),
            ));
        }

        if availability.max_calendar_days == 0 || availability.max_calendar_days > MAX_CALENDAR_DAYS
        {
            return Err(ConfigError::Invalid(format!(
                "max_calendar_days must be between 1 and {}",
                MAX_CALENDAR_DAYS
            )));
        }

        if self.deletion.max_wait_ms == 0 || self.deletion.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "deletion budgets must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `RENTAL_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup("RENTAL_LEAD_TIME_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.availability.lead_time_exemption_enabled = true,
                "0" | "false" | "no" => self.availability.lead_time_exemption_enabled = false,
                _ => warn!(value = %enabled, "Unknown RENTAL_LEAD_TIME_ENABLED value"),
            }
        }

        if let Some(days) = lookup("RENTAL_LEAD_TIME_DAYS") {
            match days.parse::<u32>() {
                Ok(d) => {
                    debug!(days = d, "Overriding lead-time exemption from environment");
                    self.availability.lead_time_exemption_days = d;
                }
                Err(_) => warn!(value = %days, "Invalid RENTAL_LEAD_TIME_DAYS"),
            }
        }

        if let Some(statuses) = lookup("RENTAL_ACTIVE_STATUSES") {
            let parsed: Result<Vec<OrderStatus>, _> = statuses
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect();
            match parsed {
                Ok(list) => {
                    debug!(?list, "Overriding active statuses from environment");
                    self.availability.active_statuses = list;
                }
                Err(e) => warn!(value = %statuses, error = %e, "Invalid RENTAL_ACTIVE_STATUSES"),
            }
        }

        if let Some(ms) = lookup("RENTAL_DELETE_MAX_WAIT_MS") {
            match ms.parse::<u64>() {
                Ok(v) => self.deletion.max_wait_ms = v,
                Err(_) => warn!(value = %ms, "Invalid RENTAL_DELETE_MAX_WAIT_MS"),
            }
        }

        if let Some(ms) = lookup("RENTAL_DELETE_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(v) => self.deletion.timeout_ms = v,
                Err(_) => warn!(value = %ms, "Invalid RENTAL_DELETE_TIMEOUT_MS"),
            }
        }

        if let Some(path) = lookup("RENTAL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rental", "engine")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The reservation policy every availability path applies.
    pub fn policy(&self) -> ReservationPolicy {
        let availability = &self.availability;
        ReservationPolicy {
            active_statuses: availability.active_statuses.clone(),
            lead_time_exemption_days: availability
                .lead_time_exemption_enabled
                .then_some(availability.lead_time_exemption_days),
        }
    }

    /// Hard-delete budget.
    pub fn budget(&self) -> TransactionBudget {
        TransactionBudget {
            max_wait: Duration::from_millis(self.deletion.max_wait_ms),
            timeout: Duration::from_millis(self.deletion.timeout_ms),
        }
    }

    /// Pool configuration for [`crate::RentalEngine::open`].
    pub fn db_config(&self) -> DbConfig {
        if self.database.path.as_os_str() == ":memory:" {
            return DbConfig::in_memory();
        }
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
