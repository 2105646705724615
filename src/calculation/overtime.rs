//! Tiered overtime pricing.
//!
//! This module provides the [`OvertimeSchedule`] tier tables and the functions
//! that price overtime hours against them.
//!
//! ## Rate Structure
//!
//! Each day classification has its own table of hour buckets. Overtime hours
//! are consumed bucket by bucket in ascending order, each bucket priced at
//! `base overtime wage × multiplier`. The final bucket is uncapped.
//!
//! Tables are validated once, when the schedule is built:
//! - buckets start at hour 0, are contiguous and never overlap
//! - only the final bucket is uncapped
//! - every multiplier is at least 1.0
//! - at every hour, a more severe classification pays at least as much as a
//!   less severe one (`Workday <= Weekend <= Holiday`)

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

use super::calendar::DateClassification;

/// Raw tier tables keyed by classification, as they appear in rate files.
pub type TierTables = BTreeMap<DateClassification, Vec<OvertimeTier>>;

/// One hour bucket of an overtime tier table.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::OvertimeTier;
/// use rust_decimal::Decimal;
///
/// // Hours 0-2 at 150%
/// let tier = OvertimeTier {
///     from_hour: Decimal::ZERO,
///     to_hour: Some(Decimal::from(2)),
///     multiplier: Decimal::new(15, 1),
/// };
/// assert_eq!(tier.capacity(), Some(Decimal::from(2)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeTier {
    /// First overtime hour of the bucket (inclusive).
    pub from_hour: Decimal,
    /// Hour the bucket ends at (exclusive); `None` for the uncapped final bucket.
    #[serde(default)]
    pub to_hour: Option<Decimal>,
    /// Multiplier applied to the base overtime wage.
    pub multiplier: Decimal,
}

impl OvertimeTier {
    /// Number of hours the bucket can absorb; `None` when uncapped.
    pub fn capacity(&self) -> Option<Decimal> {
        self.to_hour.map(|to| to - self.from_hour)
    }

    fn contains_hour(&self, hour: Decimal) -> bool {
        hour >= self.from_hour && self.to_hour.is_none_or(|to| hour < to)
    }
}

/// Validated overtime tier tables for every configured classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TierTables", into = "TierTables")]
pub struct OvertimeSchedule {
    tables: TierTables,
}

impl OvertimeSchedule {
    /// Validates and builds a schedule.
    ///
    /// Tiers are sorted by starting hour before validation, so tier positions
    /// in errors refer to hour order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RateConfig`] naming the classification and tier
    /// when a table is empty, has gaps or overlaps, caps its final tier,
    /// uses a multiplier below 1.0, or pays less than a less severe
    /// classification at some hour.
    pub fn new(mut tables: TierTables) -> EngineResult<Self> {
        for (classification, tiers) in tables.iter_mut() {
            tiers.sort_by(|a, b| a.from_hour.cmp(&b.from_hour));
            validate_table(*classification, tiers)?;
        }
        validate_severity(&tables)?;
        Ok(Self { tables })
    }

    /// Returns the tier table for a classification.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RateConfig`] if no table exists for it.
    pub fn tiers(&self, classification: DateClassification) -> EngineResult<&[OvertimeTier]> {
        self.tables
            .get(&classification)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::RateConfig {
                classification: classification.to_string(),
                tier: None,
                message: "no overtime tier table configured".to_string(),
            })
    }

    /// Classifications that have a tier table.
    pub fn classifications(&self) -> impl Iterator<Item = DateClassification> + '_ {
        self.tables.keys().copied()
    }
}

impl TryFrom<TierTables> for OvertimeSchedule {
    type Error = EngineError;

    fn try_from(tables: TierTables) -> Result<Self, Self::Error> {
        Self::new(tables)
    }
}

impl From<OvertimeSchedule> for TierTables {
    fn from(schedule: OvertimeSchedule) -> Self {
        schedule.tables
    }
}

fn rate_config_error(
    classification: DateClassification,
    tier: Option<usize>,
    message: String,
) -> EngineError {
    EngineError::RateConfig {
        classification: classification.to_string(),
        tier,
        message,
    }
}

fn validate_table(classification: DateClassification, tiers: &[OvertimeTier]) -> EngineResult<()> {
    let Some(first) = tiers.first() else {
        return Err(rate_config_error(
            classification,
            None,
            "tier table is empty".to_string(),
        ));
    };

    if first.from_hour != Decimal::ZERO {
        return Err(rate_config_error(
            classification,
            Some(1),
            format!("first tier must start at hour 0, not {}", first.from_hour),
        ));
    }

    for (index, tier) in tiers.iter().enumerate() {
        let position = index + 1;

        if tier.multiplier < Decimal::ONE {
            return Err(rate_config_error(
                classification,
                Some(position),
                format!("multiplier {} is below 1.0", tier.multiplier),
            ));
        }

        if let Some(to) = tier.to_hour.filter(|to| *to <= tier.from_hour) {
            return Err(rate_config_error(
                classification,
                Some(position),
                format!("ends at hour {} but starts at hour {}", to, tier.from_hour),
            ));
        }

        match (tiers.get(index + 1), tier.to_hour) {
            (Some(_), None) => {
                return Err(rate_config_error(
                    classification,
                    Some(position),
                    "only the final tier may be uncapped".to_string(),
                ));
            }
            (Some(next), Some(to)) if to < next.from_hour => {
                return Err(rate_config_error(
                    classification,
                    Some(position),
                    format!("gap between hour {} and hour {}", to, next.from_hour),
                ));
            }
            (Some(next), Some(to)) if to > next.from_hour => {
                return Err(rate_config_error(
                    classification,
                    Some(position),
                    format!("overlaps the next tier starting at hour {}", next.from_hour),
                ));
            }
            (None, Some(_)) => {
                return Err(rate_config_error(
                    classification,
                    Some(position),
                    "final tier must be uncapped".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

fn marginal_multiplier(tiers: &[OvertimeTier], hour: Decimal) -> Decimal {
    tiers
        .iter()
        .find(|t| t.contains_hour(hour))
        .map(|t| t.multiplier)
        .unwrap_or(Decimal::ZERO)
}

fn validate_severity(tables: &TierTables) -> EngineResult<()> {
    // BTreeMap iteration is in severity order.
    let present: Vec<(&DateClassification, &Vec<OvertimeTier>)> = tables.iter().collect();

    for pair in present.windows(2) {
        let (lower_class, lower) = pair[0];
        let (higher_class, higher) = pair[1];

        let mut boundaries: Vec<Decimal> = lower
            .iter()
            .chain(higher.iter())
            .map(|t| t.from_hour)
            .collect();
        boundaries.sort();
        boundaries.dedup();

        for hour in boundaries {
            let lower_multiplier = marginal_multiplier(lower, hour);
            let higher_multiplier = marginal_multiplier(higher, hour);
            if higher_multiplier < lower_multiplier {
                let position = higher
                    .iter()
                    .position(|t| t.contains_hour(hour))
                    .map(|i| i + 1);
                return Err(rate_config_error(
                    *higher_class,
                    position,
                    format!(
                        "multiplier {} at hour {} is below the {} multiplier {}",
                        higher_multiplier, hour, lower_class, lower_multiplier
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// The portion of overtime absorbed by one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeTierLine {
    /// 1-based tier position.
    pub tier: usize,
    /// Hours absorbed by this tier.
    pub hours: Decimal,
    /// The tier multiplier.
    pub multiplier: Decimal,
    /// Hourly rate (`base wage × multiplier`).
    pub rate: Decimal,
    /// `hours × rate`, unrounded.
    pub amount: Decimal,
}

/// The result of pricing one record's overtime.
///
/// Contains the per-tier breakdown and the audit steps documenting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePayResult {
    /// The day classification the hours were priced under.
    pub classification: DateClassification,
    /// Total overtime hours priced.
    pub hours: Decimal,
    /// Total overtime pay, unrounded.
    pub amount: Decimal,
    /// One line per tier that absorbed hours.
    pub tier_lines: Vec<OvertimeTierLine>,
    /// Audit steps recording each tier calculation.
    pub audit_steps: Vec<AuditStep>,
}

/// Calculates tiered overtime pay for one record.
///
/// Hours are consumed tier by tier in ascending order; each tier absorbs
/// `min(remaining, capacity)` hours at `base_overtime_wage × multiplier` and
/// the uncapped final tier absorbs the rest. Zero hours price to zero without
/// consulting the schedule.
///
/// # Arguments
///
/// * `overtime_hours` - The overtime hours to price (never negative; the
///   attendance ledger rejects negative hours)
/// * `base_overtime_wage` - The role's base hourly overtime wage
/// * `classification` - The day classification of the record's date
/// * `schedule` - The validated tier tables
/// * `step_number_start` - The starting step number for audit trail sequencing
///
/// # Errors
///
/// Returns [`EngineError::RateConfig`] when the schedule has no table for
/// `classification`.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::{
///     DateClassification, OvertimeSchedule, OvertimeTier, calculate_overtime_pay,
/// };
/// use rust_decimal::Decimal;
/// use std::collections::BTreeMap;
///
/// let mut tables = BTreeMap::new();
/// tables.insert(
///     DateClassification::Workday,
///     vec![
///         OvertimeTier {
///             from_hour: Decimal::ZERO,
///             to_hour: Some(Decimal::from(2)),
///             multiplier: Decimal::new(15, 1),
///         },
///         OvertimeTier {
///             from_hour: Decimal::from(2),
///             to_hour: None,
///             multiplier: Decimal::from(2),
///         },
///     ],
/// );
/// let schedule = OvertimeSchedule::new(tables).unwrap();
///
/// let result = calculate_overtime_pay(
///     Decimal::from(3),
///     Decimal::from(10_000),
///     DateClassification::Workday,
///     &schedule,
///     1,
/// )
/// .unwrap();
///
/// // 2h × 1.5 × 10,000 + 1h × 2.0 × 10,000
/// assert_eq!(result.amount, Decimal::from(50_000));
/// assert_eq!(result.tier_lines.len(), 2);
/// ```
pub fn calculate_overtime_pay(
    overtime_hours: Decimal,
    base_overtime_wage: Decimal,
    classification: DateClassification,
    schedule: &OvertimeSchedule,
    step_number_start: u32,
) -> EngineResult<OvertimePayResult> {
    let mut tier_lines = Vec::new();
    let mut audit_steps = Vec::new();

    if overtime_hours <= Decimal::ZERO {
        return Ok(OvertimePayResult {
            classification,
            hours: Decimal::ZERO,
            amount: Decimal::ZERO,
            tier_lines,
            audit_steps,
        });
    }

    let tiers = schedule.tiers(classification)?;
    let mut remaining = overtime_hours;
    let mut step_number = step_number_start;

    for (index, tier) in tiers.iter().enumerate() {
        if remaining <= Decimal::ZERO {
            break;
        }

        let absorbed = match tier.capacity() {
            Some(capacity) => remaining.min(capacity),
            None => remaining,
        };
        let rate = base_overtime_wage * tier.multiplier;
        let amount = absorbed * rate;
        let position = index + 1;

        let bucket = match tier.to_hour {
            Some(to) => format!("hours {}-{}", tier.from_hour.normalize(), to.normalize()),
            None => format!("hours from {}", tier.from_hour.normalize()),
        };

        audit_steps.push(AuditStep {
            step_number,
            rule_id: format!("overtime_tier_{}", position),
            rule_name: format!("{} Overtime Tier {}", title_case(classification), position),
            input: serde_json::json!({
                "hours": absorbed.normalize().to_string(),
                "base_wage": base_overtime_wage.normalize().to_string(),
                "classification": classification.to_string()
            }),
            output: serde_json::json!({
                "multiplier": tier.multiplier.normalize().to_string(),
                "rate": rate.normalize().to_string(),
                "amount": amount.normalize().to_string()
            }),
            reasoning: format!(
                "{} of {} overtime at {}%: {} hours × {} = {}",
                bucket,
                classification,
                (tier.multiplier * Decimal::from(100)).normalize(),
                absorbed.normalize(),
                rate.normalize(),
                amount.normalize()
            ),
        });

        tier_lines.push(OvertimeTierLine {
            tier: position,
            hours: absorbed,
            multiplier: tier.multiplier,
            rate,
            amount,
        });

        remaining -= absorbed;
        step_number += 1;
    }

    let amount = tier_lines.iter().map(|l| l.amount).sum();

    Ok(OvertimePayResult {
        classification,
        hours: overtime_hours,
        amount,
        tier_lines,
        audit_steps,
    })
}

/// Prices overtime hours, returning only the unrounded amount.
///
/// See [`calculate_overtime_pay`] for the pricing rules.
pub fn price_overtime(
    schedule: &OvertimeSchedule,
    classification: DateClassification,
    overtime_hours: Decimal,
    base_overtime_wage: Decimal,
) -> EngineResult<Decimal> {
    calculate_overtime_pay(overtime_hours, base_overtime_wage, classification, schedule, 1)
        .map(|result| result.amount)
}

fn title_case(classification: DateClassification) -> &'static str {
    match classification {
        DateClassification::Workday => "Workday",
        DateClassification::Weekend => "Weekend",
        DateClassification::Holiday => "Holiday",
    }
}
