//! Role and salary component models.
//!
//! A [`Role`] carries the salary components every employee in that role is
//! paid under. Roles live inside an effective-dated rate version and are
//! never edited in place: new values become a new version.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The salary components attached to a role.
///
/// Field names follow the source system's payroll vocabulary.
///
/// # Example
///
/// ```
/// use labor_cost_engine::models::SalaryComponentInfo;
/// use rust_decimal::Decimal;
///
/// let salary = SalaryComponentInfo {
///     gaji_pokok: Decimal::from(5_000_000),
///     tunjangan_tetap: Decimal::from(1_000_000),
///     tunjangan_tidak_tetap: Decimal::from(600_000),
///     transport: Decimal::from(30_000),
///     biaya_tetap_harian: Decimal::from(20_000),
///     upah_lembur_harian: Decimal::from(10_000),
/// };
/// assert!(salary.first_negative().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryComponentInfo {
    /// Base salary, paid in full per period.
    pub gaji_pokok: Decimal,
    /// Fixed allowance, paid in full per period.
    pub tunjangan_tetap: Decimal,
    /// Variable allowance per period, paid only when the employee attended.
    pub tunjangan_tidak_tetap: Decimal,
    /// Transport allowance per day present.
    pub transport: Decimal,
    /// Fixed cost per day present.
    pub biaya_tetap_harian: Decimal,
    /// Base hourly overtime wage that tier multipliers apply to.
    pub upah_lembur_harian: Decimal,
}

impl SalaryComponentInfo {
    /// Returns the name of the first component below zero, if any.
    pub fn first_negative(&self) -> Option<&'static str> {
        [
            ("gaji_pokok", self.gaji_pokok),
            ("tunjangan_tetap", self.tunjangan_tetap),
            ("tunjangan_tidak_tetap", self.tunjangan_tidak_tetap),
            ("transport", self.transport),
            ("biaya_tetap_harian", self.biaya_tetap_harian),
            ("upah_lembur_harian", self.upah_lembur_harian),
        ]
        .into_iter()
        .find(|(_, value)| *value < Decimal::ZERO)
        .map(|(name, _)| name)
    }
}

/// A personnel role and its salary components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role code, unique within a rate version (e.g. "mandor").
    pub code: String,
    /// Human-readable role name.
    pub name: String,
    /// The salary components paid under this role.
    pub salary_component: SalaryComponentInfo,
}

/// Binds an employee to the role they are paid under for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAssignment {
    /// The employee.
    pub employee_id: String,
    /// Code of the role in the period's rate version.
    pub role_code: String,
}
