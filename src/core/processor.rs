//! Due-schedule processing
//!
//! Turns every active schedule whose `next_date` has arrived into one concrete
//! transaction dated today, then moves the schedule's `next_date` past today. A schedule
//! that fell several periods behind still produces a single transaction per run; the
//! missed periods are skipped, not back-filled. Schedules whose `end_date` has passed
//! are deactivated instead of materialized.
//!
//! A run is one database transaction. It opens by writing the `last_recurring_run`
//! marker, which takes the database write lock before the due set is read, and the
//! due set is selected `FOR UPDATE` where the backend supports row locks. Overlapping
//! runs therefore serialize instead of materializing the same schedule twice.

use crate::{
    clock::Clock,
    core::{
        schedule::compute_next_occurrence,
        transaction::{MaterializedTransaction, RECURRING_MARKER, insert_materialized},
    },
    entities::{RecurringTransaction, SystemState, recurring_transaction, system_state, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

const LAST_RECURRING_RUN_KEY: &str = "last_recurring_run";

/// Outcome of a processing run, for logging and operator output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    /// Date the run treated as today
    pub run_date: NaiveDate,
    /// Transactions written by the run
    pub materialized: Vec<transaction::Model>,
    /// Ids of schedules deactivated because their end date passed
    pub expired: Vec<i64>,
}

/// Retrieves the date of the last processing run from the `system_state` table.
///
/// # Arguments
/// * `db` - Database connection
///
/// # Returns
/// * `Ok(Some(date))` - Date of the most recent run
/// * `Ok(None)` - No run recorded yet
pub async fn get_last_run_date(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_RECURRING_RUN_KEY))
        .one(db)
        .await?;

    match state {
        Some(s) => NaiveDate::parse_from_str(&s.value, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::Config {
                message: format!("Failed to parse last run date: {e}"),
            }),
        None => Ok(None),
    }
}

/// Records `date` as the last run. Inside a run this is the first write, so it also
/// claims the database write lock for the rest of the batch.
///
/// # Arguments
/// * `db` - Database connection or open transaction
/// * `date` - The run date to store
async fn set_last_run_date<C>(db: &C, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let date_str = date.format("%Y-%m-%d").to_string();
    let now = Utc::now().naive_utc();

    let updated = SystemState::update_many()
        .col_expr(system_state::Column::Value, Expr::value(date_str.clone()))
        .col_expr(system_state::Column::UpdatedAt, Expr::value(now))
        .filter(system_state::Column::Key.eq(LAST_RECURRING_RUN_KEY))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        let new_state = system_state::ActiveModel {
            key: Set(LAST_RECURRING_RUN_KEY.to_string()),
            value: Set(date_str),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Processes every due schedule and returns the transactions it wrote.
///
/// See [`process_due_with_summary`] for the expired-schedule details.
///
/// # Returns
/// The transactions written by this run, in schedule id order.
pub async fn process_due(
    db: &DatabaseConnection,
    clock: &impl Clock,
) -> Result<Vec<transaction::Model>> {
    Ok(process_due_with_summary(db, clock).await?.materialized)
}

/// Processes every due schedule in a single database transaction.
///
/// For each active schedule with `next_date <= today`:
/// 1. If its `end_date` is before today, it is deactivated and skipped
/// 2. Otherwise one transaction dated today is written, marked `(Recurring)`
/// 3. `next_date` is caught up past today, counted from the current `next_date`
///
/// Nothing is committed unless every schedule is processed successfully.
///
/// # Arguments
/// * `db` - Database connection
/// * `clock` - Source of today's date
///
/// # Errors
/// Any store failure or unreadable stored frequency aborts the whole run.
#[instrument(skip(db, clock))]
pub async fn process_due_with_summary(
    db: &DatabaseConnection,
    clock: &impl Clock,
) -> Result<ProcessSummary> {
    let today = clock.today();
    let txn = db.begin().await?;

    set_last_run_date(&txn, today).await?;

    let due = RecurringTransaction::find()
        .filter(recurring_transaction::Column::IsActive.eq(true))
        .filter(recurring_transaction::Column::NextDate.lte(today))
        .order_by_asc(recurring_transaction::Column::Id)
        .lock_exclusive()
        .all(&txn)
        .await?;

    debug!(due = due.len(), %today, "Selected due recurring schedules");

    let mut materialized = Vec::new();
    let mut expired = Vec::new();
    let now = Utc::now().naive_utc();

    for schedule in due {
        let schedule_id = schedule.id;

        if schedule.end_date.is_some_and(|end| end < today) {
            let mut active: recurring_transaction::ActiveModel = schedule.into();
            active.is_active = Set(false);
            active.updated_at = Set(now);
            active.update(&txn).await?;

            info!(schedule_id, "Recurring schedule ended, deactivated");
            expired.push(schedule_id);
            continue;
        }

        let frequency = schedule.frequency()?;
        let next_date = compute_next_occurrence(frequency, schedule.next_date, today)?;

        let created = insert_materialized(
            &txn,
            MaterializedTransaction::from_schedule(&schedule, today, RECURRING_MARKER),
        )
        .await?;

        let mut active: recurring_transaction::ActiveModel = schedule.into();
        active.next_date = Set(next_date);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        debug!(
            schedule_id,
            transaction_id = created.id,
            %next_date,
            "Materialized recurring transaction"
        );
        materialized.push(created);
    }

    // All schedule updates and inserts succeed or none do
    txn.commit().await?;

    info!(
        materialized = materialized.len(),
        expired = expired.len(),
        %today,
        "Processed due recurring schedules"
    );

    Ok(ProcessSummary {
        run_date: today,
        materialized,
        expired,
    })
}

/// Formats a processing summary into a human-readable string.
#[must_use]
pub fn format_process_summary(summary: &ProcessSummary) -> String {
    use std::fmt::Write;

    let mut text = format!(
        "Recurring run - {} - {} transaction(s) created, {} schedule(s) ended\n",
        summary.run_date.format("%Y-%m-%d"),
        summary.materialized.len(),
        summary.expired.len()
    );

    for created in &summary.materialized {
        // Writing to a String cannot fail
        let _ = writeln!(
            text,
            "  {}",
            crate::core::report::format_transaction_summary(created)
        );
    }

    text
}
