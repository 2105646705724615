//! Error types for the Labor Cost Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while computing or storing payroll.
//! Every variant carries the identity of the offending record, role, tier or
//! period so that callers can correct source data and retry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a single attendance record.
///
/// Attendance records are unique per `(employee_id, date, work_order_id)`,
/// so this triple is what every attendance error reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The date worked.
    pub date: NaiveDate,
    /// The work order (SPK) the hours are allocated to.
    pub work_order_id: String,
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.employee_id, self.date, self.work_order_id)
    }
}

/// The specific rule an attendance record broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendanceViolation {
    /// Regular or overtime hours were below zero.
    NegativeHours,
    /// Regular plus overtime hours are too large to add up.
    HoursOutOfRange,
    /// Regular plus overtime hours exceeded the policy maximum for one record.
    ExceedsMaxDailyHours {
        /// Hours on the record.
        hours: Decimal,
        /// The configured maximum.
        max: Decimal,
    },
    /// Another record already exists for the same employee, date and work order.
    Duplicate,
    /// All records for the employee on this date add up to more than a day.
    ExceedsDayTotal {
        /// Running total once this record is included.
        total: Decimal,
    },
    /// The record is dated outside the payroll period.
    OutsidePeriod {
        /// Period start (inclusive).
        start_date: NaiveDate,
        /// Period end (inclusive).
        end_date: NaiveDate,
    },
    /// The work order is not in the supplied catalog.
    UnknownWorkOrder,
}

impl std::fmt::Display for AttendanceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceViolation::NegativeHours => write!(f, "hours must not be negative"),
            AttendanceViolation::HoursOutOfRange => write!(f, "hours are out of range"),
            AttendanceViolation::ExceedsMaxDailyHours { hours, max } => {
                write!(f, "{} hours exceeds the maximum of {} per record", hours, max)
            }
            AttendanceViolation::Duplicate => {
                write!(f, "duplicate record for employee, date and work order")
            }
            AttendanceViolation::ExceedsDayTotal { total } => {
                write!(f, "{} hours recorded for the day exceeds 24", total)
            }
            AttendanceViolation::OutsidePeriod {
                start_date,
                end_date,
            } => write!(f, "date is outside the period {} to {}", start_date, end_date),
            AttendanceViolation::UnknownWorkOrder => write!(f, "work order is not known"),
        }
    }
}

/// The main error type for the Labor Cost Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use labor_cost_engine::error::EngineError;
///
/// let error = EngineError::RoleNotFound {
///     employee_id: "emp_001".to_string(),
///     role_code: "juru_ukur".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Role 'juru_ukur' for employee 'emp_001' has no registered salary components"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An attendance record failed ledger validation.
    #[error("Invalid attendance record '{record}': {violation}")]
    InvalidAttendance {
        /// The offending record.
        record: RecordKey,
        /// The rule it broke.
        violation: AttendanceViolation,
    },

    /// The employee's role has no salary components in the rate version used.
    #[error("Role '{role_code}' for employee '{employee_id}' has no registered salary components")]
    RoleNotFound {
        /// The employee being paid.
        employee_id: String,
        /// The role code that could not be resolved.
        role_code: String,
    },

    /// An employee has attendance but no role assignment.
    #[error("Employee '{employee_id}' has attendance but no role assignment")]
    AssignmentNotFound {
        /// The unassigned employee.
        employee_id: String,
    },

    /// An employee was assigned two different roles for the same period.
    #[error("Employee '{employee_id}' is assigned both '{first}' and '{second}'")]
    ConflictingAssignment {
        /// The employee with conflicting assignments.
        employee_id: String,
        /// The role seen first.
        first: String,
        /// The conflicting role.
        second: String,
    },

    /// A role's salary components are malformed.
    #[error("Invalid role '{role_code}': {message}")]
    InvalidRole {
        /// The role code.
        role_code: String,
        /// A description of what made the role invalid.
        message: String,
    },

    /// The overtime tier table is missing or malformed.
    #[error("Overtime rate configuration error for '{classification}'{}: {message}", .tier.map(|t| format!(" tier {}", t)).unwrap_or_default())]
    RateConfig {
        /// The day classification whose table is at fault.
        classification: String,
        /// Position (1-based, in hour order) of the offending tier, when a
        /// single tier is at fault.
        tier: Option<usize>,
        /// A description of the problem.
        message: String,
    },

    /// No rate version is effective on the given date.
    #[error("No rate version effective on {date}")]
    RateVersionNotFound {
        /// The date for which rates were requested.
        date: NaiveDate,
    },

    /// The period was finalized and can no longer change.
    #[error("Payroll period '{period_id}' is finalized and cannot be modified")]
    PeriodFinalized {
        /// The finalized period.
        period_id: String,
    },

    /// The period has not been finalized yet.
    #[error("Payroll period '{period_id}' is not finalized")]
    PeriodNotFinalized {
        /// The open period.
        period_id: String,
    },

    /// The period does not exist in the store.
    #[error("Payroll period not found: {period_id}")]
    PeriodNotFound {
        /// The requested period id.
        period_id: String,
    },

    /// A period with the same id already exists.
    #[error("Payroll period already exists: {period_id}")]
    PeriodAlreadyExists {
        /// The duplicate period id.
        period_id: String,
    },

    /// The period's own fields are inconsistent.
    #[error("Invalid payroll period '{period_id}': {message}")]
    InvalidPeriod {
        /// The period id.
        period_id: String,
        /// A description of what made the period invalid.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
