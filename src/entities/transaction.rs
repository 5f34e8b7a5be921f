//! Transaction entity - A concrete financial transaction.
//!
//! Rows written by the recurring engine copy the schedule's amount, `transaction_type`
//! and category at materialization time; the description carries a marker such as
//! `(Recurring)` instead of a back-reference to the schedule.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Transaction amount
    pub amount: f64,
    /// Lowercase transaction type
    pub transaction_type: String,
    /// Lowercase category
    pub category: String,
    /// Human-readable description of the transaction
    pub description: String,
    /// Calendar date the transaction is booked on
    pub date: Date,
    /// When the row was written
    pub created_at: DateTime,
}

/// `Transaction` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
