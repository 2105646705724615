//! Attendance record and work order models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RecordKey;

/// Hours one employee worked on one date against one work order.
///
/// # Example
///
/// ```
/// use labor_cost_engine::models::AttendanceRecord;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let record = AttendanceRecord {
///     employee_id: "emp_001".to_string(),
///     date: NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
///     work_order_id: "SPK-001".to_string(),
///     regular_hours: Decimal::from(8),
///     overtime_hours: Decimal::from(3),
/// };
///
/// assert_eq!(record.total_hours(), Decimal::from(11));
/// assert_eq!(record.key().to_string(), "emp_001/2026-01-13/SPK-001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The employee who worked.
    pub employee_id: String,
    /// The date worked.
    pub date: NaiveDate,
    /// The work order (SPK) the hours are charged to.
    pub work_order_id: String,
    /// Ordinary hours.
    pub regular_hours: Decimal,
    /// Overtime hours, priced by tier.
    #[serde(default)]
    pub overtime_hours: Decimal,
}

impl AttendanceRecord {
    /// Regular plus overtime hours.
    pub fn total_hours(&self) -> Decimal {
        self.regular_hours + self.overtime_hours
    }

    /// The `(employee_id, date, work_order_id)` identity of this record.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            employee_id: self.employee_id.clone(),
            date: self.date,
            work_order_id: self.work_order_id.clone(),
        }
    }
}

/// A work order (SPK) that labor cost is allocated to.
///
/// The engine only reads work orders; it never changes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Work order number.
    pub id: String,
    /// Cost center the work order is booked against.
    pub cost_center: String,
}
