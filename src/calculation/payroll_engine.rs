//! Payroll period computation.
//!
//! This module combines the rate version, the holiday calendar, the validated
//! attendance ledger and tiered overtime pricing into one
//! [`PayrollLineItem`] per employee with attendance, including the labor cost
//! allocated to each work order.
//!
//! ## Pipeline
//!
//! 1. Validate the whole attendance ledger (the day-total check spans work
//!    orders and therefore employees' records as a whole).
//! 2. Resolve every employee's role, in employee order.
//! 3. Compute each employee's line item on the rayon pool. Employees share no
//!    mutable state; the first error in employee order aborts the period and
//!    every other result is discarded.
//!
//! ## Allocation policy
//!
//! Overtime pay goes to the work order of the record that earned it. The
//! remaining components (base salary, both allowances, transport and fixed
//! daily cost) form a pool apportioned by each record's share of the
//! employee's regular hours. An employee with only overtime hours is
//! apportioned by total hours; one with no hours at all, equally per record.
//! Amounts are rounded to the currency scale and the residual cents go to
//! the work order with the largest unrounded share, so allocations always
//! sum to the grand total.

use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::config::PeriodSnapshot;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Allocation, AttendanceRecord, AuditStep, AuditTrace, AuditWarning, EmployeeAssignment,
    PayrollComputation, PayrollLineItem, PayrollPeriod, Role, WorkOrder,
};

use super::attendance_ledger::{ValidatedLedger, validate_period_attendance};
use super::overtime::calculate_overtime_pay;

/// Rounds a monetary amount to `scale` decimal places, half away from zero,
/// and fixes its scale so that equal amounts serialize identically.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(12345, 3), 2).to_string(), "12.35");
/// assert_eq!(round_money(Decimal::from(7), 2).to_string(), "7.00");
/// ```
pub fn round_money(amount: Decimal, scale: u32) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

fn money(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Computes one employee's line item.
///
/// `records` are the employee's attendance records in ledger order. With no
/// records the employee was absent: variable allowance, transport, fixed
/// daily cost and overtime are all zero, the grand total is base salary plus
/// fixed allowance, and nothing is allocated.
///
/// # Errors
///
/// Returns [`EngineError::RateConfig`] when overtime falls on a day
/// classification without a tier table.
pub fn compute_line_item(
    employee_id: &str,
    role: &Role,
    records: &[&AttendanceRecord],
    snapshot: &PeriodSnapshot,
    period_id: &str,
) -> EngineResult<PayrollLineItem> {
    let scale = snapshot.policy.currency_scale;
    let salary = &role.salary_component;
    let calendar = &snapshot.calendar;
    let schedule = snapshot.rate_version.overtime();

    let mut steps: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<AuditWarning> = Vec::new();
    let mut step_number: u32 = 1;

    steps.push(AuditStep {
        step_number,
        rule_id: "role_lookup".to_string(),
        rule_name: "Role Salary Components".to_string(),
        input: serde_json::json!({
            "employee_id": employee_id,
            "role_code": role.code,
            "rate_version": snapshot.rate_version.version
        }),
        output: serde_json::json!({
            "gaji_pokok": money(salary.gaji_pokok),
            "tunjangan_tetap": money(salary.tunjangan_tetap),
            "tunjangan_tidak_tetap": money(salary.tunjangan_tidak_tetap),
            "transport": money(salary.transport),
            "biaya_tetap_harian": money(salary.biaya_tetap_harian),
            "upah_lembur_harian": money(salary.upah_lembur_harian)
        }),
        reasoning: format!(
            "Employee {} paid as {} under rate version {}",
            employee_id, role.name, snapshot.rate_version.version
        ),
    });
    step_number += 1;

    let dates: BTreeSet<_> = records.iter().map(|r| r.date).collect();
    let days_present = dates.len() as u32;
    let days = Decimal::from(days_present);

    let base_salary = round_money(salary.gaji_pokok, scale);
    let fixed_allowance = round_money(salary.tunjangan_tetap, scale);
    let variable_allowance = if days_present >= 1 {
        round_money(salary.tunjangan_tidak_tetap, scale)
    } else {
        round_money(Decimal::ZERO, scale)
    };
    let transport_total = round_money(salary.transport * days, scale);
    let daily_fixed_cost_total = round_money(salary.biaya_tetap_harian * days, scale);

    steps.push(AuditStep {
        step_number,
        rule_id: "period_components".to_string(),
        rule_name: "Period Salary Components".to_string(),
        input: serde_json::json!({
            "days_present": days_present,
            "transport": money(salary.transport),
            "biaya_tetap_harian": money(salary.biaya_tetap_harian)
        }),
        output: serde_json::json!({
            "base_salary": money(base_salary),
            "fixed_allowance": money(fixed_allowance),
            "variable_allowance": money(variable_allowance),
            "transport_total": money(transport_total),
            "daily_fixed_cost_total": money(daily_fixed_cost_total)
        }),
        reasoning: if days_present >= 1 {
            format!(
                "{} days present: full base salary and allowances, transport {} × {} days, fixed daily cost {} × {} days",
                days_present,
                money(salary.transport),
                days_present,
                money(salary.biaya_tetap_harian),
                days_present
            )
        } else {
            "No days present: base salary and fixed allowance only".to_string()
        },
    });
    step_number += 1;

    for date in dates.iter().filter(|d| !calendar.covers(**d)) {
        warnings.push(AuditWarning {
            code: "HOLIDAY_DATA_MISSING".to_string(),
            message: format!(
                "No holiday data for {}; classified by weekday only",
                date
            ),
            severity: "low".to_string(),
        });
    }

    let mut record_overtime: Vec<Decimal> = Vec::with_capacity(records.len());
    for record in records {
        let classification = calendar.classify(record.date);
        let overtime = calculate_overtime_pay(
            record.overtime_hours,
            salary.upah_lembur_harian,
            classification,
            schedule,
            step_number + 1,
        )?;

        steps.push(AuditStep {
            step_number,
            rule_id: "attendance_record".to_string(),
            rule_name: "Attendance Record Pricing".to_string(),
            input: serde_json::json!({
                "date": record.date.to_string(),
                "work_order_id": record.work_order_id,
                "regular_hours": record.regular_hours.normalize().to_string(),
                "overtime_hours": record.overtime_hours.normalize().to_string()
            }),
            output: serde_json::json!({
                "classification": classification.to_string(),
                "holiday": calendar.holiday_name(record.date),
                "overtime_pay": money(overtime.amount)
            }),
            reasoning: format!(
                "{} classified as {}; {} overtime hours priced at {}",
                record.date,
                classification,
                record.overtime_hours.normalize(),
                money(overtime.amount)
            ),
        });
        step_number += 1 + overtime.audit_steps.len() as u32;
        steps.extend(overtime.audit_steps);
        record_overtime.push(overtime.amount);
    }

    let overtime_pay_total = round_money(record_overtime.iter().copied().sum(), scale);
    let grand_total = base_salary
        + fixed_allowance
        + variable_allowance
        + transport_total
        + daily_fixed_cost_total
        + overtime_pay_total;

    let pool = grand_total - overtime_pay_total;
    let (allocations, residual) = allocate(records, &record_overtime, pool, grand_total, scale);

    if !allocations.is_empty() {
        steps.push(AuditStep {
            step_number,
            rule_id: "cost_allocation".to_string(),
            rule_name: "Work Order Cost Allocation".to_string(),
            input: serde_json::json!({
                "regular_pool": money(pool),
                "overtime_pay_total": money(overtime_pay_total),
                "records": records.len()
            }),
            output: serde_json::json!({
                "allocations": allocations
                    .iter()
                    .map(|a| serde_json::json!({
                        "work_order_id": a.work_order_id,
                        "amount": money(a.amount)
                    }))
                    .collect::<Vec<_>>(),
                "rounding_residual": money(residual)
            }),
            reasoning: format!(
                "Regular pool {} apportioned by regular hours, overtime charged to its own work order; residual {} assigned to the largest share",
                money(pool),
                money(residual)
            ),
        });
    }

    debug!(
        employee_id,
        role_code = %role.code,
        days_present,
        grand_total = %grand_total,
        "Computed payroll line item"
    );

    Ok(PayrollLineItem {
        employee_id: employee_id.to_string(),
        period_id: period_id.to_string(),
        role_code: role.code.clone(),
        days_present,
        base_salary,
        fixed_allowance,
        variable_allowance,
        transport_total,
        daily_fixed_cost_total,
        overtime_pay_total,
        grand_total,
        allocations,
        audit_trace: AuditTrace { steps, warnings },
    })
}

/// Splits `grand_total` across the records' work orders.
///
/// Returns the allocations in first-seen work-order order and the rounding
/// residual that was added to the largest share.
fn allocate(
    records: &[&AttendanceRecord],
    record_overtime: &[Decimal],
    pool: Decimal,
    grand_total: Decimal,
    scale: u32,
) -> (Vec<Allocation>, Decimal) {
    if records.is_empty() {
        return (Vec::new(), Decimal::ZERO);
    }

    let regular: Decimal = records.iter().map(|r| r.regular_hours).sum();
    let total: Decimal = records.iter().map(|r| r.total_hours()).sum();
    let weights: Vec<Decimal> = if regular > Decimal::ZERO {
        records.iter().map(|r| r.regular_hours).collect()
    } else if total > Decimal::ZERO {
        records.iter().map(|r| r.total_hours()).collect()
    } else {
        vec![Decimal::ONE; records.len()]
    };
    let weight_sum: Decimal = weights.iter().copied().sum();

    let mut order: Vec<(String, Decimal)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for ((record, weight), overtime) in records.iter().zip(&weights).zip(record_overtime) {
        let share = pool * *weight / weight_sum + *overtime;
        match index.get(record.work_order_id.as_str()) {
            Some(&i) => order[i].1 += share,
            None => {
                index.insert(record.work_order_id.as_str(), order.len());
                order.push((record.work_order_id.clone(), share));
            }
        }
    }

    let mut allocations: Vec<Allocation> = order
        .iter()
        .map(|(work_order_id, raw)| Allocation {
            work_order_id: work_order_id.clone(),
            amount: round_money(*raw, scale),
        })
        .collect();

    let allocated: Decimal = allocations.iter().map(|a| a.amount).sum();
    let residual = grand_total - allocated;
    if !residual.is_zero() {
        // Largest raw share first; the stable sort keeps first-seen order on ties.
        let mut ranked: Vec<usize> = (0..order.len()).collect();
        ranked.sort_by(|a, b| order[*b].1.cmp(&order[*a].1));

        // A negative residual never takes an allocation below zero; the
        // remainder moves on to the next largest share.
        let mut remaining = residual;
        for i in ranked {
            let adjustment = if remaining > Decimal::ZERO {
                remaining
            } else {
                remaining.max(-allocations[i].amount)
            };
            allocations[i].amount += adjustment;
            remaining -= adjustment;
            if remaining.is_zero() {
                break;
            }
        }
    }

    (allocations, residual)
}

fn resolve_assignments(assignments: &[EmployeeAssignment]) -> EngineResult<HashMap<&str, &str>> {
    let mut roles: HashMap<&str, &str> = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        match roles.get(assignment.employee_id.as_str()) {
            Some(existing) if *existing != assignment.role_code => {
                return Err(EngineError::ConflictingAssignment {
                    employee_id: assignment.employee_id.clone(),
                    first: existing.to_string(),
                    second: assignment.role_code.clone(),
                });
            }
            Some(_) => {}
            None => {
                roles.insert(&assignment.employee_id, &assignment.role_code);
            }
        }
    }
    Ok(roles)
}

/// Computes line items for every employee with attendance in the ledger.
///
/// Employees without attendance records get no line item, even if they have
/// an assignment. The ledger must already be validated; see
/// [`run_payroll`] for the full two-phase pipeline.
///
/// # Errors
///
/// - [`EngineError::ConflictingAssignment`] if an employee has two roles
/// - [`EngineError::AssignmentNotFound`] if an employee with attendance has no role
/// - [`EngineError::RoleNotFound`] if the role is not in the snapshot's rate version
/// - [`EngineError::RateConfig`] propagated from overtime pricing
///
/// No partial result is returned on error.
pub fn compute_period(
    period: &PayrollPeriod,
    snapshot: &PeriodSnapshot,
    ledger: &ValidatedLedger,
    assignments: &[EmployeeAssignment],
) -> EngineResult<PayrollComputation> {
    let roles = resolve_assignments(assignments)?;
    let rate_version = &snapshot.rate_version;

    let mut work: Vec<(&str, &Role, Vec<&AttendanceRecord>)> = Vec::new();
    for (employee_id, records) in ledger.by_employee() {
        let role_code = roles
            .get(employee_id)
            .ok_or_else(|| EngineError::AssignmentNotFound {
                employee_id: employee_id.to_string(),
            })?;
        let role = rate_version
            .role(role_code)
            .ok_or_else(|| EngineError::RoleNotFound {
                employee_id: employee_id.to_string(),
                role_code: role_code.to_string(),
            })?;
        work.push((employee_id, role, records));
    }

    let results: Vec<EngineResult<PayrollLineItem>> = work
        .par_iter()
        .map(|(employee_id, role, records)| {
            compute_line_item(employee_id, role, records, snapshot, &period.id)
        })
        .collect();
    let line_items = results.into_iter().collect::<EngineResult<Vec<_>>>()?;

    let computation = PayrollComputation::new(&period.id, &rate_version.version, line_items)?;
    info!(
        period_id = %period.id,
        rate_version = %rate_version.version,
        employees = computation.line_items.len(),
        grand_total = %computation.grand_total(),
        "Computed payroll period"
    );
    Ok(computation)
}

/// Runs the full pipeline: validate the raw attendance for the period, then
/// compute every employee's line item.
///
/// Any error aborts the whole period; nothing is partially applied.
pub fn run_payroll(
    period: &PayrollPeriod,
    snapshot: &PeriodSnapshot,
    records: Vec<AttendanceRecord>,
    assignments: &[EmployeeAssignment],
    work_orders: Option<&[WorkOrder]>,
) -> EngineResult<PayrollComputation> {
    let ledger = validate_period_attendance(
        records,
        snapshot.policy.max_daily_hours,
        period,
        work_orders,
    )
    .inspect_err(|err| warn!(period_id = %period.id, error = %err, "Attendance validation failed"))?;

    compute_period(period, snapshot, &ledger, assignments)
        .inspect_err(|err| warn!(period_id = %period.id, error = %err, "Payroll computation failed"))
}
