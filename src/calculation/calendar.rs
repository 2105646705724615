//! Day classification against a holiday calendar.
//!
//! This module provides the [`DateClassification`] enum that drives overtime
//! multiplier selection and the [`HolidayCalendar`] snapshot that classifies
//! dates. Holiday data is supplied externally; the engine never edits it.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Represents the type of day for overtime rate selection.
///
/// Variants are ordered by severity, so `Workday < Weekend < Holiday`.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::DateClassification;
///
/// assert!(DateClassification::Workday < DateClassification::Holiday);
/// assert_eq!(DateClassification::Weekend.to_string(), "weekend");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DateClassification {
    /// An ordinary working day.
    Workday,
    /// A configured weekend day that is not a holiday.
    Weekend,
    /// A holiday from the calendar, regardless of weekday.
    Holiday,
}

impl DateClassification {
    /// All classifications in ascending severity.
    pub const ALL: [DateClassification; 3] = [
        DateClassification::Workday,
        DateClassification::Weekend,
        DateClassification::Holiday,
    ];
}

impl std::fmt::Display for DateClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateClassification::Workday => write!(f, "workday"),
            DateClassification::Weekend => write!(f, "weekend"),
            DateClassification::Holiday => write!(f, "holiday"),
        }
    }
}

/// A dated entry from the holiday calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    /// The calendar date.
    pub date: NaiveDate,
    /// Name of the holiday (e.g. "Hari Kemerdekaan").
    pub name: String,
    /// Whether the date is a holiday. Entries with `false` are recorded
    /// days (such as a cancelled holiday) that classify by weekday.
    #[serde(default = "default_is_holiday")]
    pub is_holiday: bool,
}

fn default_is_holiday() -> bool {
    true
}

/// Default weekend days: Saturday and Sunday.
pub fn default_weekend_days() -> Vec<Weekday> {
    vec![Weekday::Sat, Weekday::Sun]
}

/// An immutable snapshot of the holiday calendar.
///
/// # Example
///
/// ```
/// use labor_cost_engine::calculation::{
///     DateClassification, HolidayCalendar, HolidayEntry, default_weekend_days,
/// };
/// use chrono::NaiveDate;
///
/// let calendar = HolidayCalendar::new(
///     None,
///     default_weekend_days(),
///     vec![HolidayEntry {
///         date: NaiveDate::from_ymd_opt(2026, 3, 21).unwrap(), // Saturday
///         name: "Hari Raya Idul Fitri".to_string(),
///         is_holiday: true,
///     }],
/// );
///
/// let idul_fitri = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
/// assert_eq!(calendar.classify(idul_fitri), DateClassification::Holiday);
///
/// let sunday = NaiveDate::from_ymd_opt(2026, 3, 22).unwrap();
/// assert_eq!(calendar.classify(sunday), DateClassification::Weekend);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    coverage: Option<(NaiveDate, NaiveDate)>,
    weekend_days: Vec<Weekday>,
    entries: BTreeMap<NaiveDate, HolidayEntry>,
}

impl HolidayCalendar {
    /// Builds a calendar snapshot.
    ///
    /// `coverage` is the inclusive range the holiday data is known to be
    /// complete for; when absent, the span of the entries is used. When two
    /// entries share a date, the date is a holiday if either says so.
    pub fn new(
        coverage: Option<(NaiveDate, NaiveDate)>,
        weekend_days: Vec<Weekday>,
        entries: Vec<HolidayEntry>,
    ) -> Self {
        let mut by_date: BTreeMap<NaiveDate, HolidayEntry> = BTreeMap::new();
        for entry in entries {
            by_date
                .entry(entry.date)
                .and_modify(|existing| existing.is_holiday |= entry.is_holiday)
                .or_insert(entry);
        }

        let coverage = coverage.or_else(|| {
            let first = by_date.keys().next().copied()?;
            let last = by_date.keys().next_back().copied()?;
            Some((first, last))
        });

        Self {
            coverage,
            weekend_days,
            entries: by_date,
        }
    }

    /// A calendar with no holiday data, classifying by weekday only.
    pub fn weekdays_only(weekend_days: Vec<Weekday>) -> Self {
        Self::new(None, weekend_days, Vec::new())
    }

    /// Classifies a date.
    ///
    /// A holiday flag wins over the weekend rule. Dates outside the coverage
    /// range classify by weekday even when an entry exists for them.
    pub fn classify(&self, date: NaiveDate) -> DateClassification {
        if self.is_holiday(date) {
            DateClassification::Holiday
        } else if self.weekend_days.contains(&date.weekday()) {
            DateClassification::Weekend
        } else {
            DateClassification::Workday
        }
    }

    /// Returns true if the calendar flags a covered date as a holiday.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_entry(date).is_some()
    }

    /// Returns the holiday name for a covered date flagged as a holiday.
    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        self.holiday_entry(date).map(|e| e.name.as_str())
    }

    fn holiday_entry(&self, date: NaiveDate) -> Option<&HolidayEntry> {
        if !self.covers(date) {
            return None;
        }
        self.entries.get(&date).filter(|e| e.is_holiday)
    }

    /// Returns true if holiday data is known to be complete for the date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.coverage
            .is_some_and(|(start, end)| date >= start && date <= end)
    }

    /// The configured weekend days.
    pub fn weekend_days(&self) -> &[Weekday] {
        &self.weekend_days
    }

    /// The inclusive coverage range, if any.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.coverage
    }
}
