//! # Hierarchical Settings
//!
//! System settings are resolved from three levels, the most specific wins:
//!
//! ```text
//!   Global  (tenant NULL, location NULL)
//!     ▲ overridden by
//!   Tenant  (tenant set, location NULL)
//!     ▲ overridden by
//!   Location (tenant set, location set)
//! ```
//!
//! Values are strings in storage. A value that does not parse is skipped and
//! the next less specific level is consulted; the skipped rows are reported
//! back so the caller can log them.

use std::collections::HashMap;

use crate::types::SystemSetting;

/// Setting keys read by the core.
pub mod keys {
    /// Minutes of trailing overage forgiven (TRADITIONAL model).
    pub const GRACE_PERIOD: &str = "grace_period";
    /// Enables the capacity check at entry.
    pub const CHECK_CAPACITY: &str = "check_capacity";
}

/// Level a setting row lives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingLevel {
    Global,
    Tenant,
    Location,
}

impl SystemSetting {
    pub fn level(&self) -> SettingLevel {
        match (&self.tenant_id, &self.location_id) {
            (None, _) => SettingLevel::Global,
            (Some(_), None) => SettingLevel::Tenant,
            (Some(_), Some(_)) => SettingLevel::Location,
        }
    }

    /// Whether this row is visible from the given tenant/location.
    fn applies_to(&self, tenant_id: Option<&str>, location_id: Option<&str>) -> bool {
        match self.level() {
            SettingLevel::Global => true,
            SettingLevel::Tenant => self.tenant_id.as_deref() == tenant_id,
            SettingLevel::Location => {
                self.tenant_id.as_deref() == tenant_id && self.location_id.as_deref() == location_id
            }
        }
    }
}

/// Outcome of a typed lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub level: Option<SettingLevel>,
    /// Rows skipped because their value did not parse.
    pub rejected: Vec<(SettingLevel, String)>,
}

/// Settings visible from one tenant/location, indexed by key and level.
#[derive(Debug, Clone, Default)]
pub struct SettingsView {
    layers: HashMap<String, Vec<(SettingLevel, String)>>,
}

impl SettingsView {
    /// Keeps the rows visible from `tenant_id` / `location_id`.
    pub fn new(rows: Vec<SystemSetting>, tenant_id: Option<&str>, location_id: Option<&str>) -> Self {
        let mut layers: HashMap<String, Vec<(SettingLevel, String)>> = HashMap::new();
        for row in rows {
            if !row.applies_to(tenant_id, location_id) {
                continue;
            }
            let level = row.level();
            layers.entry(row.key).or_default().push((level, row.value));
        }
        for values in layers.values_mut() {
            // Most specific first
            values.sort_by(|a, b| b.0.cmp(&a.0));
        }
        Self { layers }
    }

    /// Raw value from the most specific level.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.layers
            .get(key)
            .and_then(|values| values.first())
            .map(|(_, v)| v.as_str())
    }

    /// Walks the levels from most to least specific, returning the first
    /// value `parse` accepts.
    pub fn resolve_with<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Resolved<T> {
        let mut rejected = Vec::new();
        if let Some(values) = self.layers.get(key) {
            for (level, raw) in values {
                match parse(raw) {
                    Some(value) => {
                        return Resolved {
                            value: Some(value),
                            level: Some(*level),
                            rejected,
                        }
                    }
                    None => rejected.push((*level, raw.clone())),
                }
            }
        }
        Resolved {
            value: None,
            level: None,
            rejected,
        }
    }

    /// Non-negative integer setting.
    pub fn resolve_count(&self, key: &str) -> Resolved<i64> {
        self.resolve_with(key, |raw| raw.trim().parse::<i64>().ok().filter(|v| *v >= 0))
    }

    pub fn resolve_flag(&self, key: &str) -> Resolved<bool> {
        self.resolve_with(key, parse_flag)
    }
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
