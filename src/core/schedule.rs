//! Next-date calculation for recurring schedules.
//!
//! [`compute_next_occurrence`] catches a reference date up to the first occurrence
//! strictly after "today" by stepping one period at a time. Day-based frequencies
//! step by a fixed number of days. Month-based frequencies keep the previous date's
//! day-of-month and clamp to the last day of a shorter month; the clamped day then
//! carries forward, so Jan 31 catches up as Feb 29, Mar 29.

use crate::errors::{Error, Result};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How often a recurring schedule repeats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day
    Daily,
    /// Every 7 days
    Weekly,
    /// Every 14 days
    Biweekly,
    /// Same day-of-month, every month
    Monthly,
    /// Same day-of-month, every 3 months
    Quarterly,
    /// Same month and day, every year
    Yearly,
}

/// One period of a [`Frequency`], in the unit it is measured in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Period {
    Days(u64),
    Months(u32),
}

impl Frequency {
    /// Every supported frequency, shortest period first.
    pub const ALL: [Self; 6] = [
        Self::Daily,
        Self::Weekly,
        Self::Biweekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
    ];

    /// The lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    const fn period(self) -> Period {
        match self {
            Self::Daily => Period::Days(1),
            Self::Weekly => Period::Days(7),
            Self::Biweekly => Period::Days(14),
            Self::Monthly => Period::Months(1),
            Self::Quarterly => Period::Months(3),
            Self::Yearly => Period::Months(12),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Frequency {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::InvalidFrequency {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

/// Advances `date` by exactly one period of `frequency`.
///
/// `advance(Monthly, Jan 31)` is Feb 28 (or Feb 29 in a leap year).
///
/// # Errors
/// Returns `DateOutOfRange` if the step leaves chrono's date range.
pub fn advance(frequency: Frequency, date: NaiveDate) -> Result<NaiveDate> {
    let stepped = match frequency.period() {
        Period::Days(days) => date.checked_add_days(Days::new(days)),
        Period::Months(months) => date.checked_add_months(Months::new(months)),
    };

    stepped.ok_or(Error::DateOutOfRange { date })
}

/// Returns the first occurrence of `frequency` counted from `reference` that falls
/// strictly after `today`.
///
/// A `reference` already after `today` is returned unchanged. Otherwise `reference`
/// is advanced one period at a time until it passes `today`, so splitting a
/// catch-up across several calls lands on the same date as a single call.
///
/// # Errors
/// Returns `DateOutOfRange` if stepping leaves chrono's date range.
pub fn compute_next_occurrence(
    frequency: Frequency,
    reference: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate> {
    let mut candidate = reference;
    while candidate <= today {
        candidate = advance(frequency, candidate)?;
    }
    Ok(candidate)
}
