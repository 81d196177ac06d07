//! Recurring transactions as the templates that generated transactions are
//! copied from.

use rusqlite::{Connection, Params, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    recurrence::{RecurrencePattern, RecurrenceRule},
    transaction::{Transaction, TransactionBuilder, TransactionKind},
};

/// A recurring transaction.
///
/// Only original transactions can be templates, transactions generated from a
/// template are never templates themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    /// The ID of the original transaction.
    pub id: TransactionId,
    /// The amount copied onto each generated transaction.
    pub amount: f64,
    /// The date of the original transaction, the anchor of the schedule.
    pub date: Date,
    /// The description copied onto each generated transaction.
    pub description: String,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The category copied onto each generated transaction.
    pub category_id: Option<CategoryId>,
    /// How often the transaction repeats. `None` if the stored pattern is not
    /// recognised or the stored schedule cannot be used, in which case no
    /// transactions are generated.
    pub pattern: Option<RecurrencePattern>,
    /// The last date the transaction may repeat on.
    pub end_date: Option<Date>,
    /// The maximum number of generated transactions.
    pub occurrence_limit: Option<u32>,
    /// Whether new transactions are still generated from this template.
    pub is_active: bool,
}

impl RecurringTemplate {
    /// The schedule of the template.
    pub fn rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            anchor: self.date,
            pattern: self.pattern,
            end_date: self.end_date,
            occurrence_limit: self.occurrence_limit,
        }
    }

    /// A copy of the template that happens on `date`.
    pub fn occurrence_on(&self, date: Date) -> TransactionBuilder {
        Transaction::build(self.amount, date, &self.description, self.kind)
            .category_id(self.category_id)
            .generated_from(self.id)
    }
}

const SELECT_TEMPLATE: &str = "SELECT id, amount, date, description, kind, category_id, \
    recurrence_pattern, recurrence_end_date, recurrence_count, is_recurring \
    FROM \"transaction\"";

/// Get the active recurring transactions that may still have dates to
/// generate as of `today`, ordered by ID.
///
/// Templates whose end date has passed are left out. Rows that cannot be read
/// as a template are logged and left out so they do not hold up the rest.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn get_due_templates(
    today: Date,
    connection: &Connection,
) -> Result<Vec<RecurringTemplate>, Error> {
    query_templates(
        &format!(
            "{SELECT_TEMPLATE}
             WHERE is_recurring = 1
                AND parent_transaction_id IS NULL
                AND (recurrence_end_date IS NULL OR recurrence_end_date >= ?1)
             ORDER BY id ASC"
        ),
        [today],
        connection,
    )
}

/// Get all active recurring transactions, most recently created first.
///
/// Rows that cannot be read as a template are logged and left out.
///
/// # Errors
/// Returns an [Error::SqlError] if the query fails.
pub fn get_recurring_templates(connection: &Connection) -> Result<Vec<RecurringTemplate>, Error> {
    query_templates(
        &format!(
            "{SELECT_TEMPLATE}
             WHERE is_recurring = 1 AND parent_transaction_id IS NULL
             ORDER BY id DESC"
        ),
        [],
        connection,
    )
}

fn query_templates(
    sql: &str,
    params: impl Params,
    connection: &Connection,
) -> Result<Vec<RecurringTemplate>, Error> {
    let mut statement = connection.prepare(sql)?;
    let mut rows = statement.query(params)?;
    let mut templates = Vec::new();

    while let Some(row) = rows.next()? {
        match map_template_row(row) {
            Ok(template) => templates.push(template),
            Err(error) => {
                let id: Option<TransactionId> = row.get(0).ok();
                tracing::warn!("Skipping malformed recurring transaction {id:?}: {error}");
            }
        }
    }

    Ok(templates)
}

/// Stop generating transactions from the recurring transaction `id`.
///
/// The transaction and anything already generated from it are kept.
///
/// # Errors
/// Returns an [Error::DeactivateMissingTemplate] if `id` is not an active
/// recurring transaction, or an [Error::SqlError] if the update fails.
pub fn deactivate_recurring_template(
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET is_recurring = 0
         WHERE id = ?1 AND is_recurring = 1 AND parent_transaction_id IS NULL",
        [id],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeactivateMissingTemplate);
    }

    Ok(())
}

fn map_template_row(row: &Row) -> Result<RecurringTemplate, rusqlite::Error> {
    let id = row.get(0)?;

    let raw_pattern: Option<String> = row.get(6)?;
    let pattern = match raw_pattern {
        Some(raw_pattern) => match raw_pattern.parse() {
            Ok(pattern) => Some(pattern),
            Err(error) => {
                tracing::warn!("Recurring transaction {id} has an unusable pattern: {error}");
                None
            }
        },
        None => None,
    };

    let raw_count: Option<i64> = row.get(8)?;
    let (pattern, occurrence_limit) = match raw_count {
        Some(count) if count < 0 => {
            tracing::warn!("Recurring transaction {id} has a negative repeat count {count}");
            (None, None)
        }
        // Anything past u32 is far beyond the occurrence cap anyway.
        Some(count) => (pattern, Some(u32::try_from(count).unwrap_or(u32::MAX))),
        None => (pattern, None),
    };

    Ok(RecurringTemplate {
        id,
        amount: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        category_id: row.get(5)?,
        pattern,
        end_date: row.get(7)?,
        occurrence_limit,
        is_active: row.get(9)?,
    })
}
