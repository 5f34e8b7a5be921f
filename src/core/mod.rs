/// Due-schedule batch processing
pub mod processor;
/// Recurring schedule lifecycle operations
pub mod recurring;
/// Text formatting for operator output
pub mod report;
/// Frequencies and next-date calculation
pub mod schedule;
/// Transaction store operations
pub mod transaction;
