//! Calculation logic for the Labor Cost Engine.
//!
//! This module contains the holiday calendar and day classification, tiered
//! overtime pricing, attendance ledger validation, and the payroll period
//! computation that turns them into per-employee line items and work-order
//! cost allocations.

mod attendance_ledger;
mod calendar;
mod overtime;
mod payroll_engine;

pub use attendance_ledger::{
    DEFAULT_MAX_DAILY_HOURS, HOURS_PER_DAY, ValidatedLedger, validate_attendance,
    validate_period_attendance,
};
pub use calendar::{DateClassification, HolidayCalendar, HolidayEntry, default_weekend_days};
pub use overtime::{
    OvertimePayResult, OvertimeSchedule, OvertimeTier, OvertimeTierLine, TierTables,
    calculate_overtime_pay, price_overtime,
};
pub use payroll_engine::{compute_line_item, compute_period, round_money, run_payroll};
