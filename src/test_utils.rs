//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and building schedule inputs with sensible defaults.

use crate::{core::recurring::NewSchedule, core::schedule::Frequency, errors::Result};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date. Panics on an invalid date, which is a test bug.
#[must_use]
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {year}-{month}-{day}"))
}

/// Builds a schedule input with sensible defaults.
///
/// # Defaults
/// * `amount`: 50.0
/// * `transaction_type`: `"expense"`
/// * `category`: `"subscriptions"`
/// * `description`: None
/// * `end_date`: None
#[must_use]
pub fn new_schedule(user_id: i64, frequency: Frequency, start_date: NaiveDate) -> NewSchedule {
    NewSchedule {
        user_id,
        amount: 50.0,
        transaction_type: "expense".to_string(),
        category: "subscriptions".to_string(),
        description: None,
        frequency,
        start_date,
        end_date: None,
    }
}
