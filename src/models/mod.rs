//! Core data models for the Labor Cost Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod line_item;
mod payroll_period;
mod role;

pub use attendance::{AttendanceRecord, WorkOrder};
pub use line_item::{
    Allocation, AuditStep, AuditTrace, AuditWarning, PayrollComputation, PayrollLineItem,
    line_items_digest,
};
pub use payroll_period::{PayrollPeriod, PeriodStatus};
pub use role::{EmployeeAssignment, Role, SalaryComponentInfo};
