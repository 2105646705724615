//! Payroll result models for the Labor Cost Engine.
//!
//! This module contains the [`PayrollLineItem`] type and its associated
//! structures that capture all outputs of a period computation, including
//! monetary components, work-order allocations and audit traces.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The audit trace for one employee's line item.
///
/// Carries no timing, so replays serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// Labor cost charged to one work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// The work order (SPK) charged.
    pub work_order_id: String,
    /// Amount charged, rounded to the currency scale.
    pub amount: Decimal,
}

/// One employee's payroll result for a period.
///
/// Created only by the computation engine and owned by its period.
/// `allocations` are in first-seen work-order order and always sum to
/// `grand_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollLineItem {
    /// The employee paid.
    pub employee_id: String,
    /// The period this line item belongs to.
    pub period_id: String,
    /// The role the employee was paid under.
    pub role_code: String,
    /// Distinct dates with at least one attendance record.
    pub days_present: u32,
    /// Base salary (gaji pokok).
    pub base_salary: Decimal,
    /// Fixed allowance (tunjangan tetap).
    pub fixed_allowance: Decimal,
    /// Variable allowance (tunjangan tidak tetap), zero without attendance.
    pub variable_allowance: Decimal,
    /// Transport allowance times days present.
    pub transport_total: Decimal,
    /// Fixed daily cost times days present.
    pub daily_fixed_cost_total: Decimal,
    /// Sum of tiered overtime pay across all records.
    pub overtime_pay_total: Decimal,
    /// Sum of all six components.
    pub grand_total: Decimal,
    /// Cost allocated to each work order.
    pub allocations: Vec<Allocation>,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl PayrollLineItem {
    /// Sum of the allocation amounts.
    pub fn allocated_total(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// Looks up the amount allocated to a work order.
    pub fn allocation_for(&self, work_order_id: &str) -> Option<Decimal> {
        self.allocations
            .iter()
            .find(|a| a.work_order_id == work_order_id)
            .map(|a| a.amount)
    }
}

/// The complete result of computing one payroll period.
///
/// Line items are sorted by employee id. `digest` is the SHA-256 of the
/// serialized line items and is what replay verification compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollComputation {
    /// The period computed.
    pub period_id: String,
    /// The rate version the computation used.
    pub rate_version: String,
    /// One line item per employee with attendance.
    pub line_items: Vec<PayrollLineItem>,
    /// Hex-encoded SHA-256 of the serialized line items.
    pub digest: String,
}

impl PayrollComputation {
    /// Builds a computation, sorting line items and computing the digest.
    pub fn new(
        period_id: impl Into<String>,
        rate_version: impl Into<String>,
        mut line_items: Vec<PayrollLineItem>,
    ) -> EngineResult<Self> {
        line_items.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        let digest = line_items_digest(&line_items)?;
        Ok(Self {
            period_id: period_id.into(),
            rate_version: rate_version.into(),
            line_items,
            digest,
        })
    }

    /// Sum of every line item's grand total.
    pub fn grand_total(&self) -> Decimal {
        self.line_items.iter().map(|li| li.grand_total).sum()
    }

    /// Looks up an employee's line item.
    pub fn line_item_for(&self, employee_id: &str) -> Option<&PayrollLineItem> {
        self.line_items
            .iter()
            .find(|li| li.employee_id == employee_id)
    }
}

/// Hex-encoded SHA-256 of the JSON serialization of `line_items`.
pub fn line_items_digest(line_items: &[PayrollLineItem]) -> EngineResult<String> {
    let bytes = serde_json::to_vec(line_items).map_err(|e| EngineError::CalculationError {
        message: format!("failed to serialize line items: {}", e),
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
