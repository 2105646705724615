//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::calculation::HolidayCalendar;
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollPeriod, Role};

use super::types::{
    HolidayCalendarConfig, PeriodSnapshot, PolicyConfig, RateRegistry, RateVersion,
    RateVersionConfig,
};

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── policy.yaml      # max_daily_hours, currency_scale, weekend_days
/// ├── holidays.yaml    # coverage range and holiday entries
/// └── rates/
///     └── 2026-01-01.yaml  # roles and overtime tiers effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use labor_cost_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let role = loader.get_role("mandor", date).unwrap();
/// println!("Base salary: {}", role.salary_component.gaji_pokok);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    policy: PolicyConfig,
    registry: RateRegistry,
    calendar: HolidayCalendar,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - An overtime tier table or role fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<PolicyConfig>(&path.join("policy.yaml"))?;
        let calendar_config = Self::load_yaml::<HolidayCalendarConfig>(&path.join("holidays.yaml"))?;
        let versions = Self::load_rates(&path.join("rates"))?;

        let loader = Self::from_parts(policy, versions, calendar_config)?;
        debug!(
            path = %path.display(),
            rate_versions = loader.registry.versions().len(),
            "Loaded payroll configuration"
        );
        Ok(loader)
    }

    /// Builds a loader from already-parsed parts.
    pub fn from_parts(
        policy: PolicyConfig,
        versions: Vec<RateVersion>,
        calendar_config: HolidayCalendarConfig,
    ) -> EngineResult<Self> {
        let coverage = match (calendar_config.coverage_start, calendar_config.coverage_end) {
            (Some(start), Some(end)) if end < start => {
                return Err(EngineError::ConfigParseError {
                    path: "holidays.yaml".to_string(),
                    message: format!("coverage ends {} before it starts {}", end, start),
                });
            }
            (Some(start), Some(end)) => Some((start, end)),
            (None, None) => None,
            _ => {
                return Err(EngineError::ConfigParseError {
                    path: "holidays.yaml".to_string(),
                    message: "coverage_start and coverage_end must be given together".to_string(),
                });
            }
        };

        let calendar = HolidayCalendar::new(
            coverage,
            policy.weekend_days.clone(),
            calendar_config.holidays,
        );

        Ok(Self {
            policy,
            registry: RateRegistry::new(versions)?,
            calendar,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all rate files from the rates directory.
    fn load_rates(rates_dir: &Path) -> EngineResult<Vec<RateVersion>> {
        let rates_dir_str = rates_dir.display().to_string();

        let entries = fs::read_dir(rates_dir).map_err(|_| EngineError::ConfigNotFound {
            path: rates_dir_str.clone(),
        })?;

        let mut versions = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: rates_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let config = Self::load_yaml::<RateVersionConfig>(&path)?;
                versions.push(RateVersion::from_config(config)?);
            }
        }

        if versions.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", rates_dir_str),
            });
        }

        Ok(versions)
    }

    /// Returns the engine policy.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Returns the rate registry.
    pub fn registry(&self) -> &RateRegistry {
        &self.registry
    }

    /// Returns the holiday calendar.
    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    /// Gets the rate version effective on a date.
    pub fn rate_version_for(&self, date: NaiveDate) -> EngineResult<&RateVersion> {
        self.registry.effective_on(date)
    }

    /// Gets a role from the rate version effective on a date.
    ///
    /// Returns [`EngineError::RoleNotFound`] with an empty employee id when
    /// the role is not in that version.
    pub fn get_role(&self, code: &str, date: NaiveDate) -> EngineResult<&Role> {
        self.rate_version_for(date)?
            .role(code)
            .ok_or_else(|| EngineError::RoleNotFound {
                employee_id: String::new(),
                role_code: code.to_string(),
            })
    }

    /// Builds the snapshot a period is computed with.
    ///
    /// The rate version is the one effective on the period's start date.
    pub fn snapshot_for(&self, period: &PayrollPeriod) -> EngineResult<PeriodSnapshot> {
        Ok(PeriodSnapshot {
            rate_version: self.rate_version_for(period.start_date)?.clone(),
            calendar: self.calendar.clone(),
            policy: self.policy.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::DateClassification;
    use rust_decimal::Decimal;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.registry().versions().len(), 2);
        assert_eq!(loader.policy().max_daily_hours, Decimal::from(12));
        assert_eq!(loader.policy().currency_scale, 2);
    }

    #[test]
    fn test_get_role_from_effective_version() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        let january = loader.get_role("mandor", date(2026, 1, 15)).unwrap();
        assert_eq!(january.name, "Mandor Lapangan");
        assert_eq!(january.salary_component.gaji_pokok, Decimal::from(5_000_000));
        assert_eq!(january.salary_component.upah_lembur_harian, Decimal::from(10_000));

        let august = loader.get_role("mandor", date(2026, 8, 1)).unwrap();
        assert_eq!(august.salary_component.gaji_pokok, Decimal::from(5_250_000));
    }

    #[test]
    fn test_get_role_unknown_returns_error() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        match loader.get_role("juru_ukur", date(2026, 1, 15)) {
            Err(EngineError::RoleNotFound { role_code, .. }) => assert_eq!(role_code, "juru_ukur"),
            other => panic!("Expected RoleNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_holiday_calendar_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let calendar = loader.calendar();

        // Idul Fitri 2026 falls on a Saturday
        assert_eq!(calendar.classify(date(2026, 3, 21)), DateClassification::Holiday);
        // Cuti bersama entry is recorded but not a holiday
        assert_eq!(calendar.classify(date(2026, 3, 20)), DateClassification::Workday);
        assert!(calendar.covers(date(2026, 12, 31)));
        assert!(!calendar.covers(date(2027, 1, 1)));
    }

    #[test]
    fn test_overtime_tables_loaded_for_all_classifications() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let version = loader.rate_version_for(date(2026, 1, 15)).unwrap();
        let classifications: Vec<DateClassification> = version.overtime().classifications().collect();
        assert_eq!(classifications, DateClassification::ALL.to_vec());
    }

    #[test]
    fn test_snapshot_pins_version_effective_on_start_date() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let period = PayrollPeriod::open("2026-06", date(2026, 6, 16), date(2026, 7, 15)).unwrap();

        let snapshot = loader.snapshot_for(&period).unwrap();
        assert_eq!(snapshot.rate_version.version, "2026.1");
        assert_eq!(snapshot.policy, *loader.policy());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        match ConfigLoader::load("/nonexistent/path") {
            Err(EngineError::ConfigNotFound { path }) => assert!(path.contains("policy.yaml")),
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_half_open_coverage_rejected() {
        let calendar = HolidayCalendarConfig {
            coverage_start: Some(date(2026, 1, 1)),
            coverage_end: None,
            holidays: vec![],
        };
        let result = ConfigLoader::from_parts(PolicyConfig::default(), vec![], calendar);
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }
}
