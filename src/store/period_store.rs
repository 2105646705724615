//! In-memory payroll period store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::calculation::run_payroll;
use crate::config::PeriodSnapshot;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, EmployeeAssignment, PayrollComputation, PayrollLineItem, PayrollPeriod,
    PeriodStatus, WorkOrder, line_items_digest,
};

/// The pinned result of a finalized period.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedPeriod {
    /// The exact rate version, calendar and policy the period was computed with.
    pub snapshot: Arc<PeriodSnapshot>,
    /// The stored line items and their digest.
    pub computation: PayrollComputation,
    /// When the period was finalized.
    pub finalized_at: DateTime<Utc>,
}

/// A period as held by the store.
#[derive(Debug, Clone, Serialize)]
pub struct StoredPeriod {
    /// The period itself.
    pub period: PayrollPeriod,
    /// Present once the period is finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized: Option<FinalizedPeriod>,
}

/// Result of replaying a finalized period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayOutcome {
    /// The replayed period.
    pub period_id: String,
    /// Digest stored at finalization.
    pub stored_digest: String,
    /// Digest of the replayed line items.
    pub replay_digest: String,
    /// Whether the two digests are equal.
    pub matches: bool,
}

/// Holds payroll periods keyed by id.
///
/// All transitions take the write lock, so finalizing is a compare-and-set
/// on the period status: of two concurrent finalizations exactly one
/// succeeds and the other sees [`EngineError::PeriodFinalized`].
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use labor_cost_engine::models::PayrollPeriod;
/// use labor_cost_engine::store::PayrollPeriodStore;
///
/// let store = PayrollPeriodStore::new();
/// let period = PayrollPeriod::open(
///     "2026-01",
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
/// )
/// .unwrap();
///
/// store.open(period).unwrap();
/// assert!(!store.period("2026-01").unwrap().is_finalized());
/// ```
#[derive(Debug, Default)]
pub struct PayrollPeriodStore {
    periods: RwLock<BTreeMap<String, StoredPeriod>>,
}

impl PayrollPeriodStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, BTreeMap<String, StoredPeriod>>> {
        self.periods.read().map_err(|e| EngineError::CalculationError {
            message: format!("period store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, BTreeMap<String, StoredPeriod>>> {
        self.periods.write().map_err(|e| EngineError::CalculationError {
            message: format!("period store lock poisoned: {}", e),
        })
    }

    /// Registers a new open period.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PeriodAlreadyExists`] if the id is taken
    /// - [`EngineError::InvalidPeriod`] if the period is not open
    pub fn open(&self, period: PayrollPeriod) -> EngineResult<()> {
        if period.is_finalized() {
            return Err(EngineError::InvalidPeriod {
                period_id: period.id,
                message: "a period can only be opened in the open status".to_string(),
            });
        }

        let mut periods = self.write()?;
        if periods.contains_key(&period.id) {
            return Err(EngineError::PeriodAlreadyExists {
                period_id: period.id,
            });
        }

        info!(
            period_id = %period.id,
            start_date = %period.start_date,
            end_date = %period.end_date,
            "Opened payroll period"
        );
        periods.insert(
            period.id.clone(),
            StoredPeriod {
                period,
                finalized: None,
            },
        );
        Ok(())
    }

    /// Returns a copy of the stored period and any finalized result.
    pub fn get(&self, period_id: &str) -> EngineResult<StoredPeriod> {
        self.read()?
            .get(period_id)
            .cloned()
            .ok_or_else(|| EngineError::PeriodNotFound {
                period_id: period_id.to_string(),
            })
    }

    /// Returns the period.
    pub fn period(&self, period_id: &str) -> EngineResult<PayrollPeriod> {
        self.get(period_id).map(|stored| stored.period)
    }

    /// Ids of all stored periods, sorted.
    pub fn period_ids(&self) -> EngineResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// Returns the finalized line items.
    ///
    /// # Errors
    ///
    /// [`EngineError::PeriodNotFinalized`] while the period is still open.
    pub fn line_items(&self, period_id: &str) -> EngineResult<Vec<PayrollLineItem>> {
        self.finalized(period_id)
            .map(|finalized| finalized.computation.line_items)
    }

    /// Returns the snapshot pinned at finalization.
    pub fn snapshot(&self, period_id: &str) -> EngineResult<Arc<PeriodSnapshot>> {
        self.finalized(period_id).map(|finalized| finalized.snapshot)
    }

    fn finalized(&self, period_id: &str) -> EngineResult<FinalizedPeriod> {
        self.get(period_id)?
            .finalized
            .ok_or_else(|| EngineError::PeriodNotFinalized {
                period_id: period_id.to_string(),
            })
    }

    /// Transitions an open period to finalized, pinning `snapshot` and the
    /// computation's line items.
    ///
    /// # Errors
    ///
    /// - [`EngineError::PeriodNotFound`] if the period does not exist
    /// - [`EngineError::PeriodFinalized`] if it is already finalized; the
    ///   stored result is left untouched
    /// - [`EngineError::InvalidPeriod`] if the computation is for another
    ///   period or another rate version than the snapshot's, or its digest
    ///   does not match its line items
    pub fn finalize(
        &self,
        period_id: &str,
        snapshot: PeriodSnapshot,
        computation: PayrollComputation,
    ) -> EngineResult<FinalizedPeriod> {
        if computation.period_id != period_id {
            return Err(EngineError::InvalidPeriod {
                period_id: period_id.to_string(),
                message: format!(
                    "computation belongs to period '{}'",
                    computation.period_id
                ),
            });
        }
        if computation.rate_version != snapshot.rate_version.version {
            return Err(EngineError::InvalidPeriod {
                period_id: period_id.to_string(),
                message: format!(
                    "computation used rate version '{}' but the snapshot pins '{}'",
                    computation.rate_version, snapshot.rate_version.version
                ),
            });
        }

        let digest = line_items_digest(&computation.line_items)?;
        if digest != computation.digest {
            return Err(EngineError::InvalidPeriod {
                period_id: period_id.to_string(),
                message: format!(
                    "computation digest '{}' does not match its line items ({})",
                    computation.digest, digest
                ),
            });
        }

        let mut periods = self.write()?;
        let stored = periods
            .get_mut(period_id)
            .ok_or_else(|| EngineError::PeriodNotFound {
                period_id: period_id.to_string(),
            })?;

        if stored.period.status != PeriodStatus::Open {
            warn!(period_id, "Rejected finalization of finalized period");
            return Err(EngineError::PeriodFinalized {
                period_id: period_id.to_string(),
            });
        }

        let finalized = FinalizedPeriod {
            snapshot: Arc::new(snapshot),
            computation,
            finalized_at: Utc::now(),
        };
        stored.period.status = PeriodStatus::Finalized;
        stored.finalized = Some(finalized.clone());

        info!(
            period_id,
            rate_version = %finalized.computation.rate_version,
            line_items = finalized.computation.line_items.len(),
            digest = %finalized.computation.digest,
            "Finalized payroll period"
        );
        Ok(finalized)
    }

    /// Recomputes a finalized period from `records` with its pinned snapshot
    /// and compares the digest of the result against the stored one.
    ///
    /// The store lock is not held while computing.
    pub fn verify_replay(
        &self,
        period_id: &str,
        records: Vec<AttendanceRecord>,
        assignments: &[EmployeeAssignment],
        work_orders: Option<&[WorkOrder]>,
    ) -> EngineResult<ReplayOutcome> {
        let stored = self.get(period_id)?;
        let finalized = stored
            .finalized
            .ok_or_else(|| EngineError::PeriodNotFinalized {
                period_id: period_id.to_string(),
            })?;

        let replay = run_payroll(
            &stored.period,
            &finalized.snapshot,
            records,
            assignments,
            work_orders,
        )?;

        let outcome = ReplayOutcome {
            period_id: period_id.to_string(),
            matches: replay.digest == finalized.computation.digest,
            stored_digest: finalized.computation.digest,
            replay_digest: replay.digest,
        };
        if outcome.matches {
            info!(period_id, digest = %outcome.stored_digest, "Replay matches stored result");
        } else {
            warn!(
                period_id,
                stored_digest = %outcome.stored_digest,
                replay_digest = %outcome.replay_digest,
                "Replay differs from stored result"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{
        DateClassification, HolidayCalendar, OvertimeSchedule, OvertimeTier, default_weekend_days,
    };
    use crate::config::{PolicyConfig, RateVersion};
    use crate::models::{Role, SalaryComponentInfo};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn snapshot(gaji_pokok: i64) -> PeriodSnapshot {
        let mut tables = BTreeMap::new();
        for classification in DateClassification::ALL {
            tables.insert(
                classification,
                vec![OvertimeTier {
                    from_hour: Decimal::ZERO,
                    to_hour: None,
                    multiplier: Decimal::from(2),
                }],
            );
        }
        let role = Role {
            code: "operator".to_string(),
            name: "Operator Alat Berat".to_string(),
            salary_component: SalaryComponentInfo {
                gaji_pokok: Decimal::from(gaji_pokok),
                tunjangan_tetap: Decimal::from(750_000),
                tunjangan_tidak_tetap: Decimal::from(500_000),
                transport: Decimal::from(25_000),
                biaya_tetap_harian: Decimal::from(15_000),
                upah_lembur_harian: Decimal::from(26_000),
            },
        };
        PeriodSnapshot {
            rate_version: RateVersion::new(
                "2026.1",
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                vec![role],
                OvertimeSchedule::new(tables).unwrap(),
            )
            .unwrap(),
            calendar: HolidayCalendar::weekdays_only(default_weekend_days()),
            policy: PolicyConfig::default(),
        }
    }

    fn february() -> PayrollPeriod {
        PayrollPeriod::open("2026-02", date(1), date(28)).unwrap()
    }

    fn records() -> Vec<AttendanceRecord> {
        vec![
            AttendanceRecord {
                employee_id: "emp_001".to_string(),
                date: date(2),
                work_order_id: "SPK-100".to_string(),
                regular_hours: Decimal::from(8),
                overtime_hours: Decimal::from(2),
            },
            AttendanceRecord {
                employee_id: "emp_001".to_string(),
                date: date(3),
                work_order_id: "SPK-200".to_string(),
                regular_hours: Decimal::from(8),
                overtime_hours: Decimal::ZERO,
            },
        ]
    }

    fn assignments() -> Vec<EmployeeAssignment> {
        vec![EmployeeAssignment {
            employee_id: "emp_001".to_string(),
            role_code: "operator".to_string(),
        }]
    }

    fn finalized_store() -> PayrollPeriodStore {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        let snap = snapshot(4_500_000);
        let computation = run_payroll(&february(), &snap, records(), &assignments(), None).unwrap();
        store.finalize("2026-02", snap, computation).unwrap();
        store
    }

    #[test]
    fn test_open_rejects_duplicate_id() {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        match store.open(february()) {
            Err(EngineError::PeriodAlreadyExists { period_id }) => assert_eq!(period_id, "2026-02"),
            other => panic!("Expected PeriodAlreadyExists, got {:?}", other),
        }
    }

    #[test]
    fn test_get_unknown_period() {
        let store = PayrollPeriodStore::new();
        assert!(matches!(
            store.get("2030-01"),
            Err(EngineError::PeriodNotFound { .. })
        ));
    }

    #[test]
    fn test_line_items_before_finalize() {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        assert!(matches!(
            store.line_items("2026-02"),
            Err(EngineError::PeriodNotFinalized { .. })
        ));
    }

    #[test]
    fn test_finalize_pins_snapshot_and_line_items() {
        let store = finalized_store();

        let period = store.period("2026-02").unwrap();
        assert_eq!(period.status, PeriodStatus::Finalized);
        assert_eq!(store.line_items("2026-02").unwrap().len(), 1);
        assert_eq!(store.snapshot("2026-02").unwrap().rate_version.version, "2026.1");
    }

    #[test]
    fn test_finalize_twice_leaves_store_unchanged() {
        let store = finalized_store();
        let before = store.get("2026-02").unwrap();

        let snap = snapshot(9_999_999);
        let recomputed = run_payroll(&february(), &snap, records(), &assignments(), None).unwrap();
        match store.finalize("2026-02", snap, recomputed) {
            Err(EngineError::PeriodFinalized { period_id }) => assert_eq!(period_id, "2026-02"),
            other => panic!("Expected PeriodFinalized, got {:?}", other),
        }

        let after = store.get("2026-02").unwrap();
        let before = before.finalized.unwrap();
        let after = after.finalized.unwrap();
        assert_eq!(before.computation, after.computation);
        assert_eq!(before.snapshot, after.snapshot);
        assert_eq!(before.finalized_at, after.finalized_at);
    }

    #[test]
    fn test_finalize_rejects_mismatched_computation() {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        let snap = snapshot(4_500_000);
        let mut computation = run_payroll(&february(), &snap, records(), &assignments(), None).unwrap();
        computation.period_id = "2026-03".to_string();

        assert!(matches!(
            store.finalize("2026-02", snap, computation),
            Err(EngineError::InvalidPeriod { .. })
        ));
        assert!(!store.period("2026-02").unwrap().is_finalized());
    }

    #[test]
    fn test_finalize_rejects_tampered_line_items() {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        let snap = snapshot(4_500_000);
        let mut computation = run_payroll(&february(), &snap, records(), &assignments(), None).unwrap();
        computation.line_items[0].grand_total += Decimal::ONE;

        match store.finalize("2026-02", snap, computation) {
            Err(EngineError::InvalidPeriod { message, .. }) => assert!(message.contains("digest")),
            other => panic!("Expected InvalidPeriod, got {:?}", other),
        }
        assert!(!store.period("2026-02").unwrap().is_finalized());
    }

    #[test]
    fn test_verify_replay_matches_with_same_ledger() {
        let store = finalized_store();
        let outcome = store
            .verify_replay("2026-02", records(), &assignments(), None)
            .unwrap();
        assert!(outcome.matches);
        assert_eq!(outcome.stored_digest, outcome.replay_digest);
    }

    #[test]
    fn test_verify_replay_detects_changed_ledger() {
        let store = finalized_store();
        let mut changed = records();
        changed[0].overtime_hours = Decimal::from(3);

        let outcome = store
            .verify_replay("2026-02", changed, &assignments(), None)
            .unwrap();
        assert!(!outcome.matches);
    }

    #[test]
    fn test_verify_replay_requires_finalized_period() {
        let store = PayrollPeriodStore::new();
        store.open(february()).unwrap();
        assert!(matches!(
            store.verify_replay("2026-02", records(), &assignments(), None),
            Err(EngineError::PeriodNotFinalized { .. })
        ));
    }

    #[test]
    fn test_concurrent_finalize_exactly_one_wins() {
        let store = Arc::new(PayrollPeriodStore::new());
        store.open(february()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let snap = snapshot(4_500_000);
                    let computation =
                        run_payroll(&february(), &snap, records(), &assignments(), None).unwrap();
                    store.finalize("2026-02", snap, computation).is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }
}
