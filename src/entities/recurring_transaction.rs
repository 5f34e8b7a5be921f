//! Recurring transaction entity - A user's template for a repeating transaction.
//!
//! Each row carries the amount and classification copied onto every materialized
//! transaction, the `frequency` it repeats at, and the `next_date` it is due.
//! Schedules are never hard-deleted; `is_active = false` terminates them.

use crate::core::schedule::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recurring transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_transactions")]
pub struct Model {
    /// Unique identifier for the schedule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Non-negative amount copied onto each materialized transaction
    pub amount: f64,
    /// Lowercase transaction type (e.g. `"expense"`, `"income"`)
    pub transaction_type: String,
    /// Lowercase category (e.g. `"rent"`, `"salary"`)
    pub category: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// One of `daily`, `weekly`, `biweekly`, `monthly`, `quarterly`, `yearly`
    pub frequency: String,
    /// First date the schedule applies to
    pub start_date: Date,
    /// Last date the schedule applies to, if bounded
    pub end_date: Option<Date>,
    /// Date of the next due occurrence
    pub next_date: Date,
    /// Whether the schedule still takes part in processing
    pub is_active: bool,
    /// When the schedule was created
    pub created_at: DateTime,
    /// When the schedule was last modified
    pub updated_at: DateTime,
}

impl Model {
    /// Parses the stored `frequency` column.
    ///
    /// Fails with [`crate::errors::Error::InvalidFrequency`] if the row holds a value
    /// outside the supported set.
    pub fn frequency(&self) -> crate::errors::Result<Frequency> {
        self.frequency.parse()
    }
}

/// `RecurringTransaction` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
