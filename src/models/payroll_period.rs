//! Payroll period model.
//!
//! This module contains the [`PayrollPeriod`] type that defines the closed
//! date range a payroll computation runs over.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Lifecycle status of a payroll period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Results may still be computed and the period may still change.
    Open,
    /// Results are frozen; the period can no longer change.
    Finalized,
}

/// A payroll period with its date range and status.
///
/// # Example
///
/// ```
/// use labor_cost_engine::models::{PayrollPeriod, PeriodStatus};
/// use chrono::NaiveDate;
///
/// let period = PayrollPeriod::open(
///     "2026-01",
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(period.status, PeriodStatus::Open);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Period identifier (e.g. "2026-01").
    pub id: String,
    /// The start date of the period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the period (inclusive).
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: PeriodStatus,
}

impl PayrollPeriod {
    /// Creates an open period, rejecting an end date before the start date.
    pub fn open(
        id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Self> {
        let id = id.into();
        if end_date < start_date {
            return Err(EngineError::InvalidPeriod {
                period_id: id,
                message: format!("end date {} is before start date {}", end_date, start_date),
            });
        }
        Ok(Self {
            id,
            start_date,
            end_date,
            status: PeriodStatus::Open,
        })
    }

    /// Checks if a given date falls within this period, inclusive of both ends.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true once the period has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.status == PeriodStatus::Finalized
    }
}
