//! Transaction store operations used by the recurring engine.
//!
//! The engine only ever appends transactions; querying them belongs to the wider
//! application. The lookups here exist for callers reporting on what the engine wrote.
//! Writes are generic over [`ConnectionTrait`] so they can join a caller's database
//! transaction.

use crate::{
    entities::{Transaction, recurring_transaction, transaction},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Description marker for transactions produced by batch processing.
pub const RECURRING_MARKER: &str = "(Recurring)";

/// Description marker for transactions produced by a manual trigger.
pub const MANUAL_MARKER: &str = "(Manual process)";

/// A transaction about to be materialized from a recurring schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedTransaction {
    /// Owning user
    pub user_id: i64,
    /// Amount copied from the schedule
    pub amount: f64,
    /// Transaction type copied from the schedule
    pub transaction_type: String,
    /// Category copied from the schedule
    pub category: String,
    /// Description with an origin marker appended
    pub description: String,
    /// Booking date
    pub date: NaiveDate,
}

impl MaterializedTransaction {
    /// Copies the schedule's current values into a transaction dated `date`.
    #[must_use]
    pub fn from_schedule(
        schedule: &recurring_transaction::Model,
        date: NaiveDate,
        marker: &str,
    ) -> Self {
        Self {
            user_id: schedule.user_id,
            amount: schedule.amount,
            transaction_type: schedule.transaction_type.clone(),
            category: schedule.category.clone(),
            description: recurring_description(schedule.description.as_deref(), marker),
            date,
        }
    }
}

/// Appends `marker` to a schedule description.
///
/// A missing or blank description yields the marker on its own.
#[must_use]
pub fn recurring_description(description: Option<&str>, marker: &str) -> String {
    match description.map(str::trim) {
        Some(text) if !text.is_empty() => format!("{text} {marker}"),
        _ => marker.to_string(),
    }
}

/// Inserts a materialized transaction and returns the stored row.
pub async fn insert_materialized<C>(
    db: &C,
    materialized: MaterializedTransaction,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let model = transaction::ActiveModel {
        user_id: Set(materialized.user_id),
        amount: Set(materialized.amount),
        transaction_type: Set(materialized.transaction_type),
        category: Set(materialized.category),
        description: Set(materialized.description),
        date: Set(materialized.date),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Retrieves all transactions for a user, newest first.
pub async fn get_transactions_for_owner(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
