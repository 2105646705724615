//! Attendance ledger validation.
//!
//! Raw attendance entries are validated as a whole before any per-employee
//! computation starts, because the day-total check spans work orders. The
//! result is an immutable [`ValidatedLedger`] snapshot.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AttendanceViolation, EngineError, EngineResult, RecordKey};
use crate::models::{AttendanceRecord, PayrollPeriod, WorkOrder};

/// Default maximum regular plus overtime hours on a single record.
pub const DEFAULT_MAX_DAILY_HOURS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Hours in a calendar day; no employee can record more on one date.
pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// An immutable, validated set of attendance records.
///
/// Records keep their input order, which fixes first-seen work-order order
/// for allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedLedger {
    records: Vec<AttendanceRecord>,
}

impl ValidatedLedger {
    /// All records in input order.
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the ledger has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by employee, employees sorted by id, records in input order.
    pub fn by_employee(&self) -> BTreeMap<&str, Vec<&AttendanceRecord>> {
        let mut groups: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(record.employee_id.as_str())
                .or_default()
                .push(record);
        }
        groups
    }
}

fn violation(record: &AttendanceRecord, violation: AttendanceViolation) -> EngineError {
    EngineError::InvalidAttendance {
        record: record.key(),
        violation,
    }
}

/// Validates attendance records into a ledger.
///
/// Checks run in order over the whole input, and the first violation found
/// is returned with the offending record's identity:
///
/// 1. hours are non-negative, representable when summed, and
///    `regular + overtime <= max_daily_hours`
/// 2. `(employee_id, date, work_order_id)` is unique
/// 3. per `(employee_id, date)`, hours across all work orders total at most 24
///
/// Records are never dropped or clamped.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::{DEFAULT_MAX_DAILY_HOURS, validate_attendance};
/// use labor_cost_engine::models::AttendanceRecord;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let record = AttendanceRecord {
///     employee_id: "emp_001".to_string(),
///     date: NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
///     work_order_id: "SPK-001".to_string(),
///     regular_hours: Decimal::from(8),
///     overtime_hours: Decimal::from(2),
/// };
///
/// let ledger = validate_attendance(vec![record.clone(), record], DEFAULT_MAX_DAILY_HOURS);
/// assert!(ledger.is_err());
/// ```
pub fn validate_attendance(
    records: Vec<AttendanceRecord>,
    max_daily_hours: Decimal,
) -> EngineResult<ValidatedLedger> {
    for record in &records {
        if record.regular_hours < Decimal::ZERO || record.overtime_hours < Decimal::ZERO {
            return Err(violation(record, AttendanceViolation::NegativeHours));
        }
        let Some(hours) = record.regular_hours.checked_add(record.overtime_hours) else {
            return Err(violation(record, AttendanceViolation::HoursOutOfRange));
        };
        if hours > max_daily_hours {
            return Err(violation(
                record,
                AttendanceViolation::ExceedsMaxDailyHours {
                    hours,
                    max: max_daily_hours,
                },
            ));
        }
    }

    let mut seen: HashSet<RecordKey> = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.key()) {
            return Err(violation(record, AttendanceViolation::Duplicate));
        }
    }

    let mut day_totals: HashMap<(&str, chrono::NaiveDate), Decimal> = HashMap::new();
    for record in &records {
        let total = day_totals
            .entry((record.employee_id.as_str(), record.date))
            .or_insert(Decimal::ZERO);
        *total = total
            .checked_add(record.total_hours())
            .ok_or_else(|| violation(record, AttendanceViolation::HoursOutOfRange))?;
        if *total > HOURS_PER_DAY {
            return Err(violation(
                record,
                AttendanceViolation::ExceedsDayTotal { total: *total },
            ));
        }
    }

    Ok(ValidatedLedger { records })
}

/// Validates attendance for a specific period.
///
/// Runs [`validate_attendance`], then checks that every record is dated
/// inside `period` and, when `work_orders` is supplied, that every record
/// names a known work order.
pub fn validate_period_attendance(
    records: Vec<AttendanceRecord>,
    max_daily_hours: Decimal,
    period: &PayrollPeriod,
    work_orders: Option<&[WorkOrder]>,
) -> EngineResult<ValidatedLedger> {
    let ledger = validate_attendance(records, max_daily_hours)?;

    if let Some(record) = ledger.records.iter().find(|r| !period.contains_date(r.date)) {
        return Err(violation(
            record,
            AttendanceViolation::OutsidePeriod {
                start_date: period.start_date,
                end_date: period.end_date,
            },
        ));
    }

    if let Some(work_orders) = work_orders {
        let known: HashSet<&str> = work_orders.iter().map(|w| w.id.as_str()).collect();
        if let Some(record) = ledger
            .records
            .iter()
            .find(|r| !known.contains(r.work_order_id.as_str()))
        {
            return Err(violation(record, AttendanceViolation::UnknownWorkOrder));
        }
    }

    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn record(employee: &str, day: u32, work_order: &str, regular: &str, overtime: &str) -> AttendanceRecord {
        AttendanceRecord {
            employee_id: employee.to_string(),
            date: date(day),
            work_order_id: work_order.to_string(),
            regular_hours: dec(regular),
            overtime_hours: dec(overtime),
        }
    }

    fn expect_violation(result: EngineResult<ValidatedLedger>) -> (RecordKey, AttendanceViolation) {
        match result {
            Err(EngineError::InvalidAttendance { record, violation }) => (record, violation),
            other => panic!("Expected InvalidAttendance, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_records_keep_input_order() {
        let ledger = validate_attendance(
            vec![
                record("emp_b", 13, "SPK-002", "8", "0"),
                record("emp_a", 13, "SPK-001", "8", "2"),
                record("emp_b", 14, "SPK-001", "4", "0"),
            ],
            DEFAULT_MAX_DAILY_HOURS,
        )
        .unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.records()[0].employee_id, "emp_b");

        let groups = ledger.by_employee();
        let employees: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(employees, vec!["emp_a", "emp_b"]);
        assert_eq!(groups["emp_b"][0].work_order_id, "SPK-002");
        assert_eq!(groups["emp_b"][1].work_order_id, "SPK-001");
    }

    #[test]
    fn test_empty_ledger_is_valid() {
        let ledger = validate_attendance(vec![], DEFAULT_MAX_DAILY_HOURS).unwrap();
        assert!(ledger.is_empty());
        assert!(ledger.by_employee().is_empty());
    }

    #[test]
    fn test_negative_hours_rejected() {
        let (key, violation) = expect_violation(validate_attendance(
            vec![record("emp_a", 13, "SPK-001", "8", "-1")],
            DEFAULT_MAX_DAILY_HOURS,
        ));
        assert_eq!(key.employee_id, "emp_a");
        assert_eq!(violation, AttendanceViolation::NegativeHours);
    }

    #[test]
    fn test_record_over_max_daily_hours_rejected() {
        let (key, violation) = expect_violation(validate_attendance(
            vec![record("emp_a", 13, "SPK-001", "9", "3.5")],
            DEFAULT_MAX_DAILY_HOURS,
        ));
        assert_eq!(key.work_order_id, "SPK-001");
        assert_eq!(
            violation,
            AttendanceViolation::ExceedsMaxDailyHours {
                hours: dec("12.5"),
                max: dec("12"),
            }
        );
    }

    #[test]
    fn test_record_at_max_daily_hours_accepted() {
        assert!(
            validate_attendance(
                vec![record("emp_a", 13, "SPK-001", "8", "4")],
                DEFAULT_MAX_DAILY_HOURS
            )
            .is_ok()
        );
    }

    #[test]
    fn test_hours_overflowing_decimal_rejected() {
        let mut huge = record("emp_a", 13, "SPK-001", "0", "0");
        huge.regular_hours = Decimal::MAX;
        huge.overtime_hours = Decimal::MAX;

        let (key, violation) =
            expect_violation(validate_attendance(vec![huge], DEFAULT_MAX_DAILY_HOURS));
        assert_eq!(key.work_order_id, "SPK-001");
        assert_eq!(violation, AttendanceViolation::HoursOutOfRange);
    }

    #[test]
    fn test_day_total_overflow_rejected() {
        let mut huge = record("emp_a", 13, "SPK-002", "0", "0");
        huge.regular_hours = Decimal::MAX;

        let (key, violation) = expect_violation(validate_attendance(
            vec![record("emp_a", 13, "SPK-001", "1", "0"), huge],
            Decimal::MAX,
        ));
        assert_eq!(key.work_order_id, "SPK-002");
        assert_eq!(violation, AttendanceViolation::HoursOutOfRange);
    }

    #[test]
    fn test_duplicate_record_rejected_with_identity() {
        let (key, violation) = expect_violation(validate_attendance(
            vec![
                record("emp_a", 13, "SPK-001", "4", "0"),
                record("emp_a", 13, "SPK-002", "4", "0"),
                record("emp_a", 13, "SPK-001", "2", "0"),
            ],
            DEFAULT_MAX_DAILY_HOURS,
        ));
        assert_eq!(
            key,
            RecordKey {
                employee_id: "emp_a".to_string(),
                date: date(13),
                work_order_id: "SPK-001".to_string(),
            }
        );
        assert_eq!(violation, AttendanceViolation::Duplicate);
    }

    #[test]
    fn test_day_total_across_work_orders_over_24_rejected() {
        let (key, violation) = expect_violation(validate_attendance(
            vec![
                record("emp_a", 13, "SPK-001", "8", "4"),
                record("emp_a", 13, "SPK-002", "8", "4"),
                record("emp_a", 13, "SPK-003", "1", "0"),
            ],
            DEFAULT_MAX_DAILY_HOURS,
        ));
        assert_eq!(key.work_order_id, "SPK-003");
        assert_eq!(violation, AttendanceViolation::ExceedsDayTotal { total: dec("25") });
    }

    #[test]
    fn test_day_total_is_per_employee() {
        assert!(
            validate_attendance(
                vec![
                    record("emp_a", 13, "SPK-001", "8", "4"),
                    record("emp_a", 13, "SPK-002", "8", "4"),
                    record("emp_b", 13, "SPK-001", "8", "4"),
                    record("emp_a", 14, "SPK-001", "8", "4"),
                ],
                DEFAULT_MAX_DAILY_HOURS,
            )
            .is_ok()
        );
    }

    #[test]
    fn test_per_record_check_runs_before_duplicate_check() {
        // The duplicate comes first in input order, but the hour check runs first.
        let (key, violation) = expect_violation(validate_attendance(
            vec![
                record("emp_a", 13, "SPK-001", "4", "0"),
                record("emp_a", 13, "SPK-001", "4", "0"),
                record("emp_b", 13, "SPK-001", "13", "0"),
            ],
            DEFAULT_MAX_DAILY_HOURS,
        ));
        assert_eq!(key.employee_id, "emp_b");
        assert!(matches!(violation, AttendanceViolation::ExceedsMaxDailyHours { .. }));
    }

    #[test]
    fn test_period_bounds_enforced() {
        let period = PayrollPeriod::open("2026-01-w2", date(12), date(18)).unwrap();
        let (key, violation) = expect_violation(validate_period_attendance(
            vec![
                record("emp_a", 13, "SPK-001", "8", "0"),
                record("emp_a", 19, "SPK-001", "8", "0"),
            ],
            DEFAULT_MAX_DAILY_HOURS,
            &period,
            None,
        ));
        assert_eq!(key.date, date(19));
        assert_eq!(
            violation,
            AttendanceViolation::OutsidePeriod {
                start_date: date(12),
                end_date: date(18),
            }
        );
    }

    #[test]
    fn test_unknown_work_order_rejected_when_catalog_supplied() {
        let period = PayrollPeriod::open("2026-01", date(1), date(31)).unwrap();
        let catalog = vec![WorkOrder {
            id: "SPK-001".to_string(),
            cost_center: "CC-JALAN".to_string(),
        }];
        let records = vec![
            record("emp_a", 13, "SPK-001", "8", "0"),
            record("emp_a", 14, "SPK-404", "8", "0"),
        ];

        assert!(
            validate_period_attendance(records.clone(), DEFAULT_MAX_DAILY_HOURS, &period, None)
                .is_ok()
        );

        let (key, violation) = expect_violation(validate_period_attendance(
            records,
            DEFAULT_MAX_DAILY_HOURS,
            &period,
            Some(&catalog),
        ));
        assert_eq!(key.work_order_id, "SPK-404");
        assert_eq!(violation, AttendanceViolation::UnknownWorkOrder);
    }
}
