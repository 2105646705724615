//! Configuration types for payroll computation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and the immutable
//! snapshots built from them.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::calculation::{
    DEFAULT_MAX_DAILY_HOURS, HolidayCalendar, HolidayEntry, OvertimeSchedule, TierTables,
    default_weekend_days,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{Role, SalaryComponentInfo};

fn default_max_daily_hours() -> Decimal {
    DEFAULT_MAX_DAILY_HOURS
}

fn default_currency_scale() -> u32 {
    2
}

/// Engine policy constants from policy.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum regular plus overtime hours on one attendance record.
    #[serde(default = "default_max_daily_hours")]
    pub max_daily_hours: Decimal,
    /// Decimal places monetary amounts are rounded to.
    #[serde(default = "default_currency_scale")]
    pub currency_scale: u32,
    /// Days of the week classified as weekend.
    #[serde(default = "default_weekend_days")]
    pub weekend_days: Vec<Weekday>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_daily_hours: default_max_daily_hours(),
            currency_scale: default_currency_scale(),
            weekend_days: default_weekend_days(),
        }
    }
}

/// A role as it appears in a rate file, keyed by its code.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// The human-readable name of the role.
    pub name: String,
    /// The role's salary components.
    pub salary_component: SalaryComponentInfo,
}

/// Rate file structure (one file per effective date).
#[derive(Debug, Clone, Deserialize)]
pub struct RateVersionConfig {
    /// Version label (e.g. "2026.1").
    pub version: String,
    /// The effective date for these rates.
    pub effective_date: NaiveDate,
    /// Map of role code to role details.
    pub roles: BTreeMap<String, RoleConfig>,
    /// Overtime tier tables by day classification.
    pub overtime: TierTables,
}

/// Holiday calendar file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayCalendarConfig {
    /// First date the holiday data is complete for.
    #[serde(default)]
    pub coverage_start: Option<NaiveDate>,
    /// Last date the holiday data is complete for.
    #[serde(default)]
    pub coverage_end: Option<NaiveDate>,
    /// Holiday entries.
    #[serde(default)]
    pub holidays: Vec<HolidayEntry>,
}

/// One effective-dated version of role salary components and overtime tiers.
///
/// Versions are immutable; changed values become a new version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateVersion {
    /// Version label.
    pub version: String,
    /// The date from which this version applies.
    pub effective_date: NaiveDate,
    roles: BTreeMap<String, Role>,
    overtime: OvertimeSchedule,
}

impl RateVersion {
    /// Builds a version, rejecting duplicate role codes and negative components.
    pub fn new(
        version: impl Into<String>,
        effective_date: NaiveDate,
        roles: Vec<Role>,
        overtime: OvertimeSchedule,
    ) -> EngineResult<Self> {
        let mut by_code = BTreeMap::new();
        for role in roles {
            if let Some(component) = role.salary_component.first_negative() {
                return Err(EngineError::InvalidRole {
                    role_code: role.code,
                    message: format!("{} must not be negative", component),
                });
            }
            if by_code.contains_key(&role.code) {
                return Err(EngineError::InvalidRole {
                    role_code: role.code,
                    message: "role code is defined twice".to_string(),
                });
            }
            by_code.insert(role.code.clone(), role);
        }

        Ok(Self {
            version: version.into(),
            effective_date,
            roles: by_code,
            overtime,
        })
    }

    /// Builds a version from its rate file, validating the overtime tables.
    pub fn from_config(config: RateVersionConfig) -> EngineResult<Self> {
        let overtime = OvertimeSchedule::new(config.overtime)?;
        let roles = config
            .roles
            .into_iter()
            .map(|(code, role)| Role {
                code,
                name: role.name,
                salary_component: role.salary_component,
            })
            .collect();
        Self::new(config.version, config.effective_date, roles, overtime)
    }

    /// Looks up a role by code.
    pub fn role(&self, code: &str) -> Option<&Role> {
        self.roles.get(code)
    }

    /// All roles, sorted by code.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// The validated overtime tier tables.
    pub fn overtime(&self) -> &OvertimeSchedule {
        &self.overtime
    }
}

/// All rate versions, sorted oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRegistry {
    versions: Vec<RateVersion>,
}

impl RateRegistry {
    /// Creates a registry, rejecting two versions with the same effective date.
    pub fn new(mut versions: Vec<RateVersion>) -> EngineResult<Self> {
        versions.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        if let Some(pair) = versions
            .windows(2)
            .find(|pair| pair[0].effective_date == pair[1].effective_date)
        {
            return Err(EngineError::ConfigParseError {
                path: format!("rates/{}", pair[1].effective_date),
                message: format!(
                    "versions '{}' and '{}' share an effective date",
                    pair[0].version, pair[1].version
                ),
            });
        }
        Ok(Self { versions })
    }

    /// Finds the most recent version effective on or before `date`.
    pub fn effective_on(&self, date: NaiveDate) -> EngineResult<&RateVersion> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.effective_date <= date)
            .ok_or(EngineError::RateVersionNotFound { date })
    }

    /// All versions, oldest first.
    pub fn versions(&self) -> &[RateVersion] {
        &self.versions
    }
}

/// The exact inputs a period is computed with.
///
/// A finalized period pins its snapshot so that replaying the same ledger
/// reproduces identical line items even after rates or holidays change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    /// The rate version in force on the period start date.
    pub rate_version: RateVersion,
    /// The holiday calendar.
    pub calendar: HolidayCalendar,
    /// Engine policy constants.
    pub policy: PolicyConfig,
}

impl PeriodSnapshot {
    /// Hex-encoded SHA-256 of the serialized snapshot.
    pub fn digest(&self) -> EngineResult<String> {
        let bytes = serde_json::to_vec(self).map_err(|e| EngineError::CalculationError {
            message: format!("failed to serialize snapshot: {}", e),
        })?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}
