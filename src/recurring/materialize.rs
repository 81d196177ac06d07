//! Turns the due dates of recurring transactions into stored transactions.

use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::TransactionId,
    recurring::template::get_due_templates,
    timezone::local_today,
    transaction::TransactionBuilder,
};

/// The outcome of a materialization run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaterializationSummary {
    /// The number of recurring transactions that were considered.
    pub processed: usize,
    /// The number of transactions created.
    pub generated: usize,
    /// The number of due dates that already had a transaction.
    pub skipped: usize,
}

impl MaterializationSummary {
    /// A one line, human readable description of the run.
    pub fn message(&self) -> String {
        if self.processed == 0 {
            return "No recurring transactions to process".to_owned();
        }

        format!(
            "Processed {} recurring transactions, generated {} new, skipped {} existing",
            self.processed, self.generated, self.skipped
        )
    }
}

/// Create the transactions that active recurring transactions are due as of
/// `today`.
///
/// Dates that already have a transaction generated from the same recurring
/// transaction are skipped, so running this more than once on the same day
/// only creates transactions on the first run. All new transactions are
/// inserted together: either all of them are stored or none are.
///
/// # Errors
/// Returns an [Error::SqlError] if the recurring transactions cannot be read
/// or the new transactions cannot be stored.
pub fn materialize_recurring_transactions(
    today: Date,
    connection: &Connection,
) -> Result<MaterializationSummary, Error> {
    materialize_with_check(today, connection, occurrence_exists)
}

/// Does the work of [materialize_recurring_transactions] with
/// `occurrence_exists` deciding which dates already have a transaction.
fn materialize_with_check<F>(
    today: Date,
    connection: &Connection,
    occurrence_exists: F,
) -> Result<MaterializationSummary, Error>
where
    F: Fn(TransactionId, Date, &Connection) -> Result<bool, rusqlite::Error>,
{
    tracing::info!("Processing recurring transactions as of {today}");

    let templates = get_due_templates(today, connection).inspect_err(|error| {
        tracing::error!("Could not fetch recurring transactions: {error}");
    })?;

    tracing::info!("Found {} recurring transactions to process", templates.len());

    let mut summary = MaterializationSummary {
        processed: templates.len(),
        ..Default::default()
    };

    if templates.is_empty() {
        return Ok(summary);
    }

    let mut staged = Vec::new();

    for template in &templates {
        if template.pattern.is_none() {
            tracing::warn!(
                "Recurring transaction {} has no usable pattern, skipping",
                template.id
            );
            continue;
        }

        let dates = template.rule().occurrences_as_of(today);
        tracing::debug!(
            "Recurring transaction {} has {} due dates",
            template.id,
            dates.len()
        );

        for date in dates {
            let exists = occurrence_exists(template.id, date, connection).unwrap_or_else(|error| {
                tracing::warn!(
                    "Could not check for an occurrence of {} on {date}, assuming none: {error}",
                    template.id
                );
                false
            });

            if exists {
                tracing::debug!("Transaction {} already has an occurrence on {date}", template.id);
                summary.skipped += 1;
            } else {
                staged.push(template.occurrence_on(date));
            }
        }
    }

    if staged.is_empty() {
        tracing::info!("{}", summary.message());
        return Ok(summary);
    }

    summary.generated = insert_occurrences(&staged, connection).inspect_err(|error| {
        tracing::error!("Could not insert generated transactions: {error}");
    })?;
    // Rows that another run inserted first were ignored by the insert.
    summary.skipped += staged.len() - summary.generated;

    tracing::info!("{}", summary.message());

    Ok(summary)
}

/// Run [materialize_recurring_transactions] for the current date in `timezone`.
///
/// # Errors
/// Returns an [Error::InvalidTimezoneError] if `timezone` is not a valid
/// timezone, an [Error::DatabaseLockError] if the lock is poisoned, or any
/// error from the run itself.
pub fn materialize_for_today(
    db_connection: &Mutex<Connection>,
    timezone: &str,
) -> Result<MaterializationSummary, Error> {
    let today = local_today(timezone)?;

    let connection = db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    materialize_recurring_transactions(today, &connection)
}

fn occurrence_exists(
    parent_id: TransactionId,
    date: Date,
    connection: &Connection,
) -> Result<bool, rusqlite::Error> {
    connection.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM \"transaction\" WHERE parent_transaction_id = ?1 AND date = ?2
        )",
        (parent_id, date),
        |row| row.get(0),
    )
}

/// Insert `occurrences` in one SQL transaction and return how many were new.
fn insert_occurrences(
    occurrences: &[TransactionBuilder],
    connection: &Connection,
) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut inserted = 0;

    {
        let mut statement = sql_transaction.prepare(
            "INSERT INTO \"transaction\" (amount, date, description, kind, category_id,
                is_recurring, is_auto_generated, parent_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, ?6)
             ON CONFLICT(parent_transaction_id, date) DO NOTHING",
        )?;

        for occurrence in occurrences {
            inserted += statement.execute((
                occurrence.amount,
                occurrence.date,
                &occurrence.description,
                occurrence.kind,
                occurrence.category_id,
                occurrence.parent_transaction_id,
            ))?;
        }
    }

    sql_transaction.commit()?;

    Ok(inserted)
}
