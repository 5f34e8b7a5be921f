//! Error types shared by every layer of the crate.

use chrono::NaiveDate;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input rejected before anything is persisted
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Amount is negative or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Frequency string outside the closed set of supported frequencies
    #[error("Invalid frequency: '{value}'")]
    InvalidFrequency {
        /// The rejected value
        value: String,
    },

    /// No recurring schedule with this id
    #[error("Recurring schedule {id} not found")]
    ScheduleNotFound {
        /// The requested id
        id: i64,
    },

    /// The requesting user does not own the schedule
    #[error("Not enough permissions for recurring schedule {id}")]
    PermissionDenied {
        /// The requested id
        id: i64,
    },

    /// Calendar arithmetic left the representable date range
    #[error("Date arithmetic overflowed starting from {date}")]
    DateOutOfRange {
        /// The date the failing step started from
        date: NaiveDate,
    },

    /// Store-layer failure; any open database transaction has been rolled back
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Details about the configuration problem
        message: String,
    },
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
