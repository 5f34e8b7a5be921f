//! Text formatting for schedules and transactions.
//!
//! These helpers render one-line summaries for the operator CLI and for logs.

use crate::entities::{recurring_transaction, transaction};

/// Formats an amount with two decimals and a currency sign, e.g. `"$1200.00"`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

/// Generates a summary line for a recurring schedule.
///
/// Formatted like `#4 $30.00 expense/gym monthly next 2024-04-01 [active] Gym`.
#[must_use]
pub fn format_schedule_summary(schedule: &recurring_transaction::Model) -> String {
    let status = if schedule.is_active {
        "active"
    } else {
        "inactive"
    };
    let ends = schedule
        .end_date
        .map(|end| format!(" until {end}"))
        .unwrap_or_default();
    let mut line = format!(
        "#{} {} {}/{} {} next {}{ends} [{status}]",
        schedule.id,
        format_amount(schedule.amount),
        schedule.transaction_type,
        schedule.category,
        schedule.frequency,
        schedule.next_date,
    );
    if let Some(description) = schedule.description.as_deref() {
        line.push(' ');
        line.push_str(description);
    }
    line
}

/// Generates a summary line for a transaction.
#[must_use]
pub fn format_transaction_summary(transaction: &transaction::Model) -> String {
    format!(
        "{} | {} | {}/{} | {}",
        transaction.date,
        format_amount(transaction.amount),
        transaction.transaction_type,
        transaction.category,
        transaction.description
    )
}
