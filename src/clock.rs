//! Source of "today" for business logic.
//!
//! Schedule calculations never read the system clock directly; every operation
//! receives a [`Clock`] so that tests and operators can pin the processing date.

use chrono::{NaiveDate, Utc};

/// Supplies the current calendar date (no time-of-day component).
pub trait Clock: Send + Sync {
    /// The date operations should treat as "today".
    fn today(&self) -> NaiveDate;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock frozen on a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
