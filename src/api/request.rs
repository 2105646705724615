//! Request types for the Labor Cost Engine API.
//!
//! This module defines the JSON request structures for the `/periods`
//! endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{AttendanceRecord, EmployeeAssignment, PayrollPeriod, WorkOrder};

/// Request body for `POST /periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPeriodRequest {
    /// Period identifier (e.g. "2026-01").
    pub id: String,
    /// The start date of the period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the period (inclusive).
    pub end_date: NaiveDate,
}

impl OpenPeriodRequest {
    /// Builds the open period this request describes.
    pub fn into_period(self) -> EngineResult<PayrollPeriod> {
        PayrollPeriod::open(self.id, self.start_date, self.end_date)
    }
}

/// Request body for the compute, finalize and replay endpoints.
///
/// Carries the attendance ledger for the period and the role of every
/// employee that appears in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// One role per employee.
    pub assignments: Vec<EmployeeAssignment>,
    /// The raw attendance ledger.
    pub attendance: Vec<AttendanceRecord>,
    /// Optional work-order catalog; when given, every record must reference
    /// one of these work orders.
    #[serde(default)]
    pub work_orders: Option<Vec<WorkOrder>>,
}
