//! Recurring schedule lifecycle - create, read, update, deactivate, and manual trigger.
//!
//! These functions are owner-agnostic: callers verify that the requesting user owns
//! a schedule before reading or mutating it ([`get_schedule_for_owner`] folds that
//! check into the lookup). Every write validates its input first, so rejected input
//! never reaches the store. Writes spanning more than one row run inside a database
//! transaction.

use crate::{
    clock::Clock,
    core::{
        schedule::{Frequency, compute_next_occurrence},
        transaction::{MANUAL_MARKER, MaterializedTransaction, insert_materialized},
    },
    entities::{RecurringTransaction, recurring_transaction, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Input for [`create_schedule`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    /// Owning user
    pub user_id: i64,
    /// Non-negative amount
    pub amount: f64,
    /// Transaction type, stored lowercase
    pub transaction_type: String,
    /// Category, stored lowercase
    pub category: String,
    /// Optional description
    pub description: Option<String>,
    /// Repetition frequency
    pub frequency: Frequency,
    /// First date the schedule applies to
    pub start_date: NaiveDate,
    /// Optional last date; must not precede `start_date`
    pub end_date: Option<NaiveDate>,
}

/// Partial update for [`update_schedule`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulePatch {
    /// New amount
    pub amount: Option<f64>,
    /// New transaction type, stored lowercase
    pub transaction_type: Option<String>,
    /// New category, stored lowercase
    pub category: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    /// New frequency; triggers a `next_date` recompute
    pub frequency: Option<Frequency>,
    /// New start date; triggers a `next_date` recompute
    pub start_date: Option<NaiveDate>,
    /// `Some(None)` removes the end date
    pub end_date: Option<Option<NaiveDate>>,
    /// Explicit next due date; ignored when a recompute is triggered
    pub next_date: Option<NaiveDate>,
    /// Reactivate or deactivate
    pub is_active: Option<bool>,
}

impl SchedulePatch {
    /// Whether applying this patch recomputes `next_date` from `start_date`.
    #[must_use]
    pub const fn recomputes_next_date(&self) -> bool {
        self.frequency.is_some() || self.start_date.is_some()
    }
}

/// Result of [`trigger_schedule`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    /// The schedule after its `next_date` was advanced
    pub schedule: recurring_transaction::Model,
    /// The transaction written by the trigger
    pub transaction: transaction::Model,
}

fn validate_amount(amount: f64) -> Result<()> {
    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn normalize_label(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_lowercase())
}

fn validate_date_range(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<()> {
    match end_date {
        Some(end) if end < start_date => Err(Error::Validation {
            message: format!("End date {end} must not precede start date {start_date}"),
        }),
        _ => Ok(()),
    }
}

/// The `next_date` a schedule starting on `start_date` has on `today`.
///
/// A start date of today or later is used as-is; an earlier one is caught up
/// past `today`.
fn initial_next_date(
    frequency: Frequency,
    start_date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate> {
    if start_date >= today {
        Ok(start_date)
    } else {
        compute_next_occurrence(frequency, start_date, today)
    }
}

/// Creates a new, active recurring schedule.
///
/// `transaction_type` and category are trimmed and lowercased. If `start_date` has
/// already passed, `next_date` is fast-forwarded to the first occurrence after today.
///
/// # Arguments
/// * `db` - Database connection
/// * `clock` - Source of today's date
/// * `new` - The schedule to create
///
/// # Errors
/// Returns `InvalidAmount` or `Validation` for malformed input, before any write.
pub async fn create_schedule(
    db: &DatabaseConnection,
    clock: &impl Clock,
    new: NewSchedule,
) -> Result<recurring_transaction::Model> {
    validate_amount(new.amount)?;
    validate_date_range(new.start_date, new.end_date)?;
    let transaction_type = normalize_label("Transaction type", &new.transaction_type)?;
    let category = normalize_label("Category", &new.category)?;

    let next_date = initial_next_date(new.frequency, new.start_date, clock.today())?;
    let now = chrono::Utc::now().naive_utc();

    let schedule = recurring_transaction::ActiveModel {
        user_id: Set(new.user_id),
        amount: Set(new.amount),
        transaction_type: Set(transaction_type),
        category: Set(category),
        description: Set(new.description),
        frequency: Set(new.frequency.as_str().to_string()),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        next_date: Set(next_date),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = schedule.insert(db).await?;
    info!(
        schedule_id = created.id,
        user_id = created.user_id,
        frequency = %new.frequency,
        %next_date,
        "Created recurring schedule"
    );
    Ok(created)
}

/// Retrieves a schedule by id, active or not.
///
/// # Returns
/// * `Ok(Some(schedule))` - The schedule exists
/// * `Ok(None)` - No schedule has this id
pub async fn get_schedule(
    db: &DatabaseConnection,
    schedule_id: i64,
) -> Result<Option<recurring_transaction::Model>> {
    RecurringTransaction::find_by_id(schedule_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a schedule owned by `user_id`.
///
/// Missing schedules and schedules owned by another user both report
/// [`Error::ScheduleNotFound`].
pub async fn get_schedule_for_owner(
    db: &DatabaseConnection,
    schedule_id: i64,
    user_id: i64,
) -> Result<recurring_transaction::Model> {
    get_schedule(db, schedule_id)
        .await?
        .filter(|schedule| schedule.user_id == user_id)
        .ok_or(Error::ScheduleNotFound { id: schedule_id })
}

/// Lists a user's active schedules, soonest due first.
pub async fn list_active_schedules(
    db: &DatabaseConnection,
    user_id: i64,
    skip: u64,
    limit: u64,
) -> Result<Vec<recurring_transaction::Model>> {
    RecurringTransaction::find()
        .filter(recurring_transaction::Column::UserId.eq(user_id))
        .filter(recurring_transaction::Column::IsActive.eq(true))
        .order_by_asc(recurring_transaction::Column::NextDate)
        .order_by_asc(recurring_transaction::Column::Id)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to a schedule.
///
/// When the patch touches `frequency` or `start_date`, `next_date` is recomputed from
/// the (possibly new) `start_date`, discarding any progress the schedule had made.
///
/// # Arguments
/// * `db` - Database connection
/// * `clock` - Source of today's date, used when `next_date` is recomputed
/// * `schedule_id` - The schedule to update
/// * `patch` - Fields to change
///
/// # Errors
/// Returns a validation error before touching the store, or `ScheduleNotFound`.
pub async fn update_schedule(
    db: &DatabaseConnection,
    clock: &impl Clock,
    schedule_id: i64,
    patch: SchedulePatch,
) -> Result<recurring_transaction::Model> {
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    let transaction_type = patch
        .transaction_type
        .as_deref()
        .map(|value| normalize_label("Transaction type", value))
        .transpose()?;
    let category = patch
        .category
        .as_deref()
        .map(|value| normalize_label("Category", value))
        .transpose()?;

    let existing = get_schedule(db, schedule_id)
        .await?
        .ok_or(Error::ScheduleNotFound { id: schedule_id })?;

    let start_date = patch.start_date.unwrap_or(existing.start_date);
    let end_date = patch.end_date.unwrap_or(existing.end_date);
    validate_date_range(start_date, end_date)?;

    let frequency = match patch.frequency {
        Some(frequency) => frequency,
        None => existing.frequency()?,
    };
    let recompute = patch.recomputes_next_date();

    let mut schedule: recurring_transaction::ActiveModel = existing.into();

    if let Some(amount) = patch.amount {
        schedule.amount = Set(amount);
    }
    if let Some(transaction_type) = transaction_type {
        schedule.transaction_type = Set(transaction_type);
    }
    if let Some(category) = category {
        schedule.category = Set(category);
    }
    if let Some(description) = patch.description {
        schedule.description = Set(description);
    }
    if let Some(is_active) = patch.is_active {
        schedule.is_active = Set(is_active);
    }
    schedule.frequency = Set(frequency.as_str().to_string());
    schedule.start_date = Set(start_date);
    schedule.end_date = Set(end_date);

    if recompute {
        let next_date = compute_next_occurrence(frequency, start_date, clock.today())?;
        debug!(schedule_id, %next_date, "Recomputed next date from start date");
        schedule.next_date = Set(next_date);
    } else if let Some(next_date) = patch.next_date {
        schedule.next_date = Set(next_date);
    }
    schedule.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = schedule.update(db).await?;
    info!(schedule_id, "Updated recurring schedule");
    Ok(updated)
}

/// Soft deletes a schedule by marking it inactive.
///
/// # Returns
/// * `Ok(Some(schedule))` - The deactivated schedule
/// * `Ok(None)` - No schedule has this id
pub async fn deactivate_schedule(
    db: &DatabaseConnection,
    schedule_id: i64,
) -> Result<Option<recurring_transaction::Model>> {
    let Some(existing) = get_schedule(db, schedule_id).await? else {
        return Ok(None);
    };

    let mut schedule: recurring_transaction::ActiveModel = existing.into();
    schedule.is_active = Set(false);
    schedule.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = schedule.update(db).await?;
    info!(schedule_id, "Deactivated recurring schedule");
    Ok(Some(updated))
}

/// Materializes one transaction from a schedule right now, whether or not it is due.
///
/// The transaction is dated today and marked as manually processed; `next_date`
/// becomes the first occurrence after today counted from today. Both writes
/// commit together.
///
/// # Returns
/// The written transaction and the advanced schedule.
///
/// # Errors
/// Returns `ScheduleNotFound` for an unknown id and `Validation` for an inactive
/// schedule. A failed write rolls back both the insert and the advance.
pub async fn trigger_schedule(
    db: &DatabaseConnection,
    clock: &impl Clock,
    schedule_id: i64,
) -> Result<TriggerOutcome> {
    let today = clock.today();
    let txn = db.begin().await?;

    let existing = RecurringTransaction::find_by_id(schedule_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(Error::ScheduleNotFound { id: schedule_id })?;

    if !existing.is_active {
        return Err(Error::Validation {
            message: format!("Recurring schedule {schedule_id} is inactive"),
        });
    }

    let frequency = existing.frequency()?;
    let next_date = compute_next_occurrence(frequency, today, today)?;

    let transaction = insert_materialized(
        &txn,
        MaterializedTransaction::from_schedule(&existing, today, MANUAL_MARKER),
    )
    .await?;

    let mut schedule: recurring_transaction::ActiveModel = existing.into();
    schedule.next_date = Set(next_date);
    schedule.updated_at = Set(chrono::Utc::now().naive_utc());
    let schedule = schedule.update(&txn).await?;

    txn.commit().await?;

    info!(
        schedule_id,
        transaction_id = transaction.id,
        %next_date,
        "Manually processed recurring schedule"
    );
    Ok(TriggerOutcome {
        schedule,
        transaction,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{clock::FixedClock, core::transaction::get_transactions_for_owner, test_utils::*};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_schedule_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let clock = FixedClock(ymd(2024, 3, 15));

        // Negative amount
        let mut input = new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1));
        input.amount = -5.0;
        let result = create_schedule(&db, &clock, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -5.0 }
        ));

        // NaN amount
        let mut input = new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1));
        input.amount = f64::NAN;
        let result = create_schedule(&db, &clock, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));

        // End before start
        let mut input = new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1));
        input.end_date = Some(ymd(2024, 3, 31));
        let result = create_schedule(&db, &clock, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Blank category
        let mut input = new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1));
        input.category = "  ".to_string();
        let result = create_schedule(&db, &clock, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_schedule_future_start() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        let mut input = new_schedule(1, Frequency::Weekly, ymd(2024, 4, 1));
        input.transaction_type = "Expense".to_string();
        input.category = " RENT ".to_string();
        input.end_date = Some(ymd(2024, 4, 1));
        let schedule = create_schedule(&db, &clock, input).await?;

        assert_eq!(schedule.next_date, ymd(2024, 4, 1));
        assert_eq!(schedule.transaction_type, "expense");
        assert_eq!(schedule.category, "rent");
        assert_eq!(schedule.frequency, "weekly");
        assert!(schedule.is_active);
        assert_eq!(schedule.created_at, schedule.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_schedule_starting_today_is_due_today() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Daily, ymd(2024, 3, 15)))
                .await?;
        assert_eq!(schedule.next_date, ymd(2024, 3, 15));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_schedule_past_start_catches_up() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        // Jan 31 -> Feb 29 -> Mar 29
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 1, 31)))
                .await?;
        assert_eq!(schedule.start_date, ymd(2024, 1, 31));
        assert_eq!(schedule.next_date, ymd(2024, 3, 29));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_schedule_for_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(7, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;

        let found = get_schedule_for_owner(&db, schedule.id, 7).await?;
        assert_eq!(found, schedule);

        let result = get_schedule_for_owner(&db, schedule.id, 8).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ScheduleNotFound { id } if id == schedule.id
        ));

        assert!(get_schedule(&db, 999).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_active_schedules_filters_and_paginates() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        let late =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 6, 1)))
                .await?;
        let early =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;
        let removed =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 5, 1)))
                .await?;
        create_schedule(&db, &clock, new_schedule(2, Frequency::Monthly, ymd(2024, 4, 1))).await?;
        deactivate_schedule(&db, removed.id).await?;

        let all = list_active_schedules(&db, 1, 0, 100).await?;
        assert_eq!(all, vec![early.clone(), late.clone()]);

        let first_page = list_active_schedules(&db, 1, 0, 1).await?;
        assert_eq!(first_page, vec![early]);
        let second_page = list_active_schedules(&db, 1, 1, 1).await?;
        assert_eq!(second_page, vec![late]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_schedule_fields_without_recompute() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 10)))
                .await?;

        let updated = update_schedule(
            &db,
            &clock,
            schedule.id,
            SchedulePatch {
                amount: Some(99.5),
                category: Some("Utilities".to_string()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.amount, 99.5);
        assert_eq!(updated.category, "utilities");
        assert_eq!(updated.description, None);
        assert_eq!(updated.next_date, schedule.next_date);
        assert_eq!(updated.frequency, "monthly");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_frequency_recomputes_from_start_date() -> Result<()> {
        let db = setup_test_db().await?;
        let schedule = create_schedule(
            &db,
            &FixedClock(ymd(2024, 1, 1)),
            new_schedule(1, Frequency::Monthly, ymd(2024, 1, 5)),
        )
        .await?;
        assert_eq!(schedule.next_date, ymd(2024, 1, 5));

        // Later on, switch to weekly: progress is discarded and the catch-up starts
        // again from Jan 5: ... Mar 8 -> Mar 15 (today) -> Mar 22
        let updated = update_schedule(
            &db,
            &FixedClock(ymd(2024, 3, 15)),
            schedule.id,
            SchedulePatch {
                frequency: Some(Frequency::Weekly),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.frequency, "weekly");
        assert_eq!(updated.start_date, ymd(2024, 1, 5));
        assert_eq!(updated.next_date, ymd(2024, 3, 22));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_start_date_to_future_uses_it_directly() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;

        let updated = update_schedule(
            &db,
            &clock,
            schedule.id,
            SchedulePatch {
                start_date: Some(ymd(2024, 9, 1)),
                // Recompute takes precedence over an explicit next date
                next_date: Some(ymd(2024, 5, 5)),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.next_date, ymd(2024, 9, 1));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_start_date_to_today_moves_one_period_ahead() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Weekly, ymd(2024, 4, 1)))
                .await?;

        // Unlike create, an update recomputes through the calculator, which only
        // returns dates after today
        let updated = update_schedule(
            &db,
            &clock,
            schedule.id,
            SchedulePatch {
                start_date: Some(ymd(2024, 3, 15)),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.start_date, ymd(2024, 3, 15));
        assert_eq!(updated.next_date, ymd(2024, 3, 22));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_explicit_next_date_and_reactivate() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;
        deactivate_schedule(&db, schedule.id).await?;

        let updated = update_schedule(
            &db,
            &clock,
            schedule.id,
            SchedulePatch {
                next_date: Some(ymd(2024, 5, 1)),
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await?;

        assert!(updated.is_active);
        assert_eq!(updated.next_date, ymd(2024, 5, 1));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_schedule_rejects_end_before_merged_start() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;

        let result = update_schedule(
            &db,
            &clock,
            schedule.id,
            SchedulePatch {
                end_date: Some(Some(ymd(2024, 3, 1))),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        // Nothing was written
        let unchanged = get_schedule(&db, schedule.id).await?.unwrap();
        assert_eq!(unchanged, schedule);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_schedule_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        let result = update_schedule(&db, &clock, 404, SchedulePatch::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ScheduleNotFound { id: 404 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_schedule_validation_skips_store() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let clock = FixedClock(ymd(2024, 3, 15));

        let result = update_schedule(
            &db,
            &clock,
            1,
            SchedulePatch {
                amount: Some(f64::INFINITY),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;

        let deactivated = deactivate_schedule(&db, schedule.id).await?.unwrap();
        assert!(!deactivated.is_active);

        // Soft delete keeps the row
        let stored = get_schedule(&db, schedule.id).await?.unwrap();
        assert!(!stored.is_active);

        assert!(deactivate_schedule(&db, 999).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let mut input = new_schedule(3, Frequency::Monthly, ymd(2024, 5, 31));
        input.description = Some("Netflix".to_string());
        let schedule = create_schedule(&db, &clock, input).await?;

        // Not due yet, but a manual trigger always materializes
        let outcome = trigger_schedule(&db, &clock, schedule.id).await?;

        assert_eq!(outcome.transaction.date, ymd(2024, 3, 15));
        assert_eq!(outcome.transaction.description, "Netflix (Manual process)");
        assert_eq!(outcome.transaction.user_id, 3);
        assert_eq!(outcome.transaction.amount, schedule.amount);
        assert_eq!(outcome.schedule.next_date, ymd(2024, 4, 15));

        let stored = get_transactions_for_owner(&db, 3).await?;
        assert_eq!(stored, vec![outcome.transaction]);

        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_schedule_rejects_missing_and_inactive() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));

        let result = trigger_schedule(&db, &clock, 12).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ScheduleNotFound { id: 12 }
        ));

        let schedule =
            create_schedule(&db, &clock, new_schedule(1, Frequency::Daily, ymd(2024, 3, 1)))
                .await?;
        deactivate_schedule(&db, schedule.id).await?;

        let result = trigger_schedule(&db, &clock, schedule.id).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));
        assert!(get_transactions_for_owner(&db, 1).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_schedule_rolls_back_when_advance_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = FixedClock(ymd(2024, 3, 15));
        let schedule =
            create_schedule(&db, &clock, new_schedule(4, Frequency::Monthly, ymd(2024, 4, 1)))
                .await?;

        // Let the transaction insert through, then fail the schedule update
        db.execute_unprepared(
            "CREATE TRIGGER block_schedule_update BEFORE UPDATE ON recurring_transactions \
             BEGIN SELECT RAISE(ABORT, 'schedule update blocked'); END",
        )
        .await?;

        let result = trigger_schedule(&db, &clock, schedule.id).await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));

        assert!(get_transactions_for_owner(&db, 4).await?.is_empty());
        let stored = get_schedule(&db, schedule.id).await?.unwrap();
        assert_eq!(stored.next_date, ymd(2024, 4, 1));
        assert_eq!(stored, schedule);

        Ok(())
    }
}
