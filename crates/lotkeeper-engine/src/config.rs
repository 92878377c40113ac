//! # Engine Configuration
//!
//! Static defaults for everything the engine needs before the database has
//! a say: pool sizing, the grace period and capacities used when no
//! SystemSetting exists, and the fallback plan table for the usage limiter.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     LOTKEEPER_DATABASE_PATH=/var/lib/lotkeeper/lot.db                  │
//! │     LOTKEEPER_MAX_CONNECTIONS=10                                       │
//! │     LOTKEEPER_GRACE_PERIOD_MINUTES=10                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/lotkeeper/lotkeeper.toml (Linux)                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SystemSetting rows in the database override `[pricing]` and `[capacity]`
//! per request; see [`crate::settings`].
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./lotkeeper.db"
//! max_connections = 5
//!
//! [pricing]
//! default_grace_period_minutes = 5
//!
//! [capacity]
//! car = 50
//! motorcycle = 30
//!
//! [usage]
//! soft_limit_bps = 8000
//! hard_limit_bps = 12000
//!
//! [[usage.fallback_plans]]
//! code = "default"
//! max_locations = 1
//! max_users = 3
//! max_sessions = 1000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use lotkeeper_core::usage::PlanLimits;
use lotkeeper_core::{VehicleType, DEFAULT_GRACE_PERIOD_MINUTES, DEFAULT_HARD_LIMIT_BPS, DEFAULT_SOFT_LIMIT_BPS};
use lotkeeper_db::DbConfig;

/// Code of the fallback entry used when a tenant's plan is not listed.
pub const DEFAULT_FALLBACK_PLAN: &str = "default";

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "lotkeeper", "lotkeeper")
        .map(|dirs| dirs.data_dir().join("lotkeeper.db"))
        .unwrap_or_else(|| PathBuf::from("./lotkeeper.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

// =============================================================================
// Pricing / Capacity Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Used when no `grace_period` setting exists at any level.
    #[serde(default = "default_grace_period")]
    pub default_grace_period_minutes: i64,
}

fn default_grace_period() -> i64 {
    DEFAULT_GRACE_PERIOD_MINUTES
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_grace_period_minutes: default_grace_period(),
        }
    }
}

/// Default capacity per vehicle type. Unset means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySettings {
    #[serde(default = "default_car_capacity")]
    pub car: Option<i64>,

    #[serde(default = "default_motorcycle_capacity")]
    pub motorcycle: Option<i64>,

    #[serde(default)]
    pub other: Option<i64>,
}

fn default_car_capacity() -> Option<i64> {
    Some(50)
}

fn default_motorcycle_capacity() -> Option<i64> {
    Some(30)
}

impl Default for CapacitySettings {
    fn default() -> Self {
        Self {
            car: default_car_capacity(),
            motorcycle: default_motorcycle_capacity(),
            other: None,
        }
    }
}

impl CapacitySettings {
    pub fn for_vehicle(&self, vehicle_type: VehicleType) -> Option<i64> {
        match vehicle_type {
            VehicleType::Car => self.car,
            VehicleType::Motorcycle => self.motorcycle,
            VehicleType::Other => self.other,
        }
    }
}

// =============================================================================
// Usage Settings
// =============================================================================

/// One row of the static plan table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPlan {
    pub code: String,
    pub max_locations: i64,
    pub max_users: i64,
    pub max_sessions: i64,
}

impl FallbackPlan {
    fn new(code: &str, max_locations: i64, max_users: i64, max_sessions: i64) -> Self {
        Self {
            code: code.to_string(),
            max_locations,
            max_users,
            max_sessions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSettings {
    #[serde(default = "default_soft_bps")]
    pub soft_limit_bps: u32,

    #[serde(default = "default_hard_bps")]
    pub hard_limit_bps: u32,

    /// Limits used when the tenant's plan cannot be loaded.
    #[serde(default = "default_fallback_plans")]
    pub fallback_plans: Vec<FallbackPlan>,
}

fn default_soft_bps() -> u32 {
    DEFAULT_SOFT_LIMIT_BPS
}

fn default_hard_bps() -> u32 {
    DEFAULT_HARD_LIMIT_BPS
}

fn default_fallback_plans() -> Vec<FallbackPlan> {
    vec![
        FallbackPlan::new("basic", 1, 3, 1_000),
        FallbackPlan::new("pro", 5, 20, 20_000),
        FallbackPlan::new("enterprise", -1, -1, -1),
        FallbackPlan::new(DEFAULT_FALLBACK_PLAN, 1, 3, 1_000),
    ]
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            soft_limit_bps: default_soft_bps(),
            hard_limit_bps: default_hard_bps(),
            fallback_plans: default_fallback_plans(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub capacity: CapacitySettings,

    #[serde(default)]
    pub usage: UsageSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (lotkeeper.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
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
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.database.max_connections == 0 {
            return Err(EngineError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(EngineError::Config(
                "database.min_connections cannot exceed max_connections".into(),
            ));
        }

        if self.pricing.default_grace_period_minutes < 0 {
            return Err(EngineError::Config(
                "pricing.default_grace_period_minutes cannot be negative".into(),
            ));
        }

        if self.usage.soft_limit_bps >= self.usage.hard_limit_bps {
            return Err(EngineError::Config(format!(
                "usage.soft_limit_bps ({}) must be below hard_limit_bps ({})",
                self.usage.soft_limit_bps, self.usage.hard_limit_bps
            )));
        }

        if self.usage.fallback_plans.is_empty() {
            return Err(EngineError::Config(
                "usage.fallback_plans must list at least one plan".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("LOTKEEPER_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("LOTKEEPER_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric LOTKEEPER_MAX_CONNECTIONS"),
            }
        }

        if let Ok(grace) = std::env::var("LOTKEEPER_GRACE_PERIOD_MINUTES") {
            match grace.parse::<i64>() {
                Ok(n) => self.pricing.default_grace_period_minutes = n,
                Err(_) => warn!(value = %grace, "Ignoring non-numeric LOTKEEPER_GRACE_PERIOD_MINUTES"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lotkeeper", "lotkeeper")
            .map(|dirs| dirs.config_dir().join("lotkeeper.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool settings for [`lotkeeper_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
    }

    /// Limits from the static table for `plan_code`.
    ///
    /// Unlisted codes get the `default` entry, or the first entry when the
    /// table has no `default`.
    pub fn fallback_limits(&self, plan_code: &str) -> PlanLimits {
        let plans = &self.usage.fallback_plans;
        let plan = plans
            .iter()
            .find(|p| p.code == plan_code)
            .or_else(|| plans.iter().find(|p| p.code == DEFAULT_FALLBACK_PLAN))
            .or_else(|| plans.first());

        let mut limits = match plan {
            Some(p) => PlanLimits::new(p.max_locations, p.max_users, p.max_sessions),
            // Empty table: never block
            None => PlanLimits::new(-1, -1, -1),
        };
        limits.soft_limit_bps = self.usage.soft_limit_bps;
        limits.hard_limit_bps = self.usage.hard_limit_bps;
        limits
    }

    pub fn is_fallback_plan(&self, plan_code: &str) -> bool {
        self.usage.fallback_plans.iter().any(|p| p.code == plan_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.pricing.default_grace_period_minutes, 5);
        assert_eq!(config.capacity.for_vehicle(VehicleType::Car), Some(50));
        assert_eq!(config.capacity.for_vehicle(VehicleType::Motorcycle), Some(30));
        assert_eq!(config.capacity.for_vehicle(VehicleType::Other), None);
        assert_eq!(config.usage.soft_limit_bps, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 5;

        config.usage.soft_limit_bps = 12_000;
        assert!(config.validate().is_err());
        config.usage.soft_limit_bps = 8_000;

        config.usage.fallback_plans.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [pricing]
            default_grace_period_minutes = 10

            [capacity]
            car = 80
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.default_grace_period_minutes, 10);
        assert_eq!(config.capacity.car, Some(80));
        assert_eq!(config.capacity.motorcycle, Some(30));
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.usage.fallback_plans.is_empty());
    }

    #[test]
    fn test_fallback_limits() {
        let config = EngineConfig::default();

        let pro = config.fallback_limits("pro");
        assert_eq!(pro.max_locations, 5);
        assert_eq!(pro.max_sessions, 20_000);

        let unknown = config.fallback_limits("legacy-gold");
        assert_eq!(unknown.max_locations, 1);
        assert_eq!(unknown.hard_limit_bps, 12_000);
    }

    #[test]
    fn test_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[usage]"));
        assert!(toml_str.contains("fallback_plans"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("lotkeeper-{}.toml", uuid::Uuid::new_v4()));
        let mut config = EngineConfig::default();
        config.pricing.default_grace_period_minutes = 12;
        config.save(Some(path.clone())).unwrap();

        let loaded = EngineConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        // Env overrides may apply on a developer machine
        if std::env::var("LOTKEEPER_GRACE_PERIOD_MINUTES").is_err() {
            assert_eq!(loaded.pricing.default_grace_period_minutes, 12);
        }
    }
}
