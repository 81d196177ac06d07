//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, TransactionId},
    recurrence::RecurrencePattern,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl TransactionKind {
    /// The name used for the kind in the database and the JSON API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("\"{other}\" is not a valid transaction kind")),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction, always positive.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// Whether this transaction is an active recurring transaction.
    pub is_recurring: bool,
    /// How often the transaction repeats. `None` if it does not repeat or the
    /// stored pattern is not recognised.
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// The last date the transaction may repeat on.
    pub recurrence_end_date: Option<Date>,
    /// The maximum number of times the transaction repeats.
    pub recurrence_count: Option<u32>,
    /// Whether the transaction was generated from a recurring transaction.
    pub is_auto_generated: bool,
    /// The recurring transaction this transaction was generated from.
    pub parent_transaction_id: Option<TransactionId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        date: Date,
        description: &str,
        kind: TransactionKind,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            kind,
            category_id: None,
            recurrence: None,
            parent_transaction_id: None,
        }
    }
}

/// The schedule given to a new recurring transaction.
#[derive(Debug, PartialEq, Clone)]
pub struct NewRecurrence {
    /// How often the transaction repeats.
    pub pattern: RecurrencePattern,
    /// The last date the transaction may repeat on.
    pub end_date: Option<Date>,
    /// The maximum number of times the transaction repeats.
    pub occurrence_limit: Option<u32>,
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::{NewRecurrence, Transaction, TransactionKind};
/// use crate::recurrence::RecurrencePattern;
///
/// let rent = Transaction::build(1200.0, date!(2025-01-15), "Rent", TransactionKind::Expense)
///     .category_id(Some(3))
///     .recurrence(Some(NewRecurrence {
///         pattern: RecurrencePattern::Monthly,
///         end_date: None,
///         occurrence_limit: Some(12),
///     }));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction, always positive.
    ///
    /// Whether it is money in or out is given by `kind`.
    pub amount: f64,

    /// The date when the transaction occurred.
    ///
    /// For a recurring transaction this is the date of the first occurrence.
    pub date: Date,

    /// A human-readable description of the transaction.
    ///
    /// # Examples
    /// - `"Salary - January 2025"`
    /// - `"Phone bill"`
    pub description: String,

    /// Whether the money was earned or spent.
    pub kind: TransactionKind,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// Makes the transaction recurring when set.
    pub recurrence: Option<NewRecurrence>,

    /// Marks the transaction as generated from this recurring transaction.
    pub parent_transaction_id: Option<TransactionId>,
}

impl TransactionBuilder {
    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the recurrence schedule for the transaction.
    pub fn recurrence(mut self, recurrence: Option<NewRecurrence>) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Mark the transaction as generated from the recurring transaction `parent_id`.
    pub fn generated_from(mut self, parent_id: TransactionId) -> Self {
        self.parent_transaction_id = Some(parent_id);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if specified category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let (is_recurring, pattern, end_date, count) = match &builder.recurrence {
        Some(recurrence) => (
            true,
            Some(recurrence.pattern.as_str()),
            recurrence.end_date,
            recurrence.occurrence_limit,
        ),
        None => (false, None, None, None),
    };

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (amount, date, description, kind, category_id,
                is_recurring, recurrence_pattern, recurrence_end_date, recurrence_count,
                is_auto_generated, parent_transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             RETURNING id, amount, date, description, kind, category_id, is_recurring,
                recurrence_pattern, recurrence_end_date, recurrence_count, is_auto_generated,
                parent_transaction_id",
        )?
        .query_row(
            (
                builder.amount,
                builder.date,
                &builder.description,
                builder.kind,
                builder.category_id,
                is_recurring,
                pattern,
                end_date,
                count,
                builder.parent_transaction_id.is_some(),
                builder.parent_transaction_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, date, description, kind, category_id, is_recurring,
                recurrence_pattern, recurrence_end_date, recurrence_count, is_auto_generated,
                parent_transaction_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all transactions, most recent first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, date, description, kind, category_id, is_recurring,
                recurrence_pattern, recurrence_end_date, recurrence_count, is_auto_generated,
                parent_transaction_id
             FROM \"transaction\" ORDER BY date DESC, id DESC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Recurring transactions and the transactions generated from them share the
/// table. Generated transactions point back at their recurring transaction
/// through `parent_transaction_id`, and at most one may exist per parent and
/// date.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                kind TEXT NOT NULL,
                category_id INTEGER,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_pattern TEXT,
                recurrence_end_date TEXT,
                recurrence_count INTEGER,
                is_auto_generated INTEGER NOT NULL DEFAULT 0,
                parent_transaction_id INTEGER,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_parent_date
            ON \"transaction\"(parent_transaction_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_recurring
            ON \"transaction\"(is_recurring, parent_transaction_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_pattern: Option<String> = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        category_id: row.get(5)?,
        is_recurring: row.get(6)?,
        recurrence_pattern: raw_pattern.and_then(|pattern| pattern.parse().ok()),
        recurrence_end_date: row.get(8)?,
        recurrence_count: row.get(9)?,
        is_auto_generated: row.get(10)?,
        parent_transaction_id: row.get(11)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        recurrence::RecurrencePattern,
        transaction::{
            NewRecurrence, Transaction, TransactionKind, count_transactions, create_transaction,
            get_all_transactions, get_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let amount = 12.3;

        let result = create_transaction(
            Transaction::build(amount, date!(2025 - 10 - 05), "", TransactionKind::Expense),
            &conn,
        );

        match result {
            Ok(transaction) => {
                assert_eq!(transaction.amount, amount);
                assert!(!transaction.is_recurring);
                assert!(!transaction.is_auto_generated);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_recurring_stores_schedule() {
        let conn = get_test_connection();

        let transaction = create_transaction(
            Transaction::build(50.0, date!(2025 - 01 - 15), "Phone", TransactionKind::Expense)
                .recurrence(Some(NewRecurrence {
                    pattern: RecurrencePattern::Monthly,
                    end_date: Some(date!(2025 - 12 - 31)),
                    occurrence_limit: None,
                })),
            &conn,
        )
        .unwrap();

        assert!(transaction.is_recurring);
        assert_eq!(
            transaction.recurrence_pattern,
            Some(RecurrencePattern::Monthly)
        );
        assert_eq!(transaction.recurrence_end_date, Some(date!(2025 - 12 - 31)));
        assert_eq!(transaction.recurrence_count, None);
        assert_eq!(get_transaction(transaction.id, &conn), Ok(transaction));
    }

    #[test]
    fn create_generated_marks_parent() {
        let conn = get_test_connection();
        let parent = create_transaction(
            Transaction::build(10.0, date!(2025 - 01 - 01), "Gym", TransactionKind::Expense),
            &conn,
        )
        .unwrap();

        let child = create_transaction(
            Transaction::build(10.0, date!(2025 - 02 - 01), "Gym", TransactionKind::Expense)
                .generated_from(parent.id),
            &conn,
        )
        .unwrap();

        assert!(child.is_auto_generated);
        assert_eq!(child.parent_transaction_id, Some(parent.id));
    }

    #[test]
    fn create_fails_on_invalid_category_id() {
        let conn = get_test_connection();
        let category_id = Some(42);
        let today = date!(2025 - 10 - 04);

        let result = create_transaction(
            Transaction::build(123.45, today, "", TransactionKind::Income)
                .category_id(category_id),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category_id)));
    }

    #[test]
    fn get_fails_on_missing_id() {
        let conn = get_test_connection();

        assert_eq!(get_transaction(1, &conn), Err(Error::NotFound));
    }

    #[test]
    fn unknown_stored_pattern_reads_as_none() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO \"transaction\" (amount, date, description, kind, is_recurring, recurrence_pattern)
             VALUES (1.0, '2025-01-01', 'odd', 'expense', 1, 'fortnightly')",
            (),
        )
        .unwrap();

        let transaction = get_transaction(1, &conn).unwrap();

        assert!(transaction.is_recurring);
        assert_eq!(transaction.recurrence_pattern, None);
    }

    #[test]
    fn get_all_orders_most_recent_first() {
        let conn = get_test_connection();
        for (day, description) in [
            (date!(2025 - 01 - 02), "b"),
            (date!(2025 - 01 - 03), "c"),
            (date!(2025 - 01 - 01), "a"),
        ] {
            create_transaction(
                Transaction::build(1.0, day, description, TransactionKind::Expense),
                &conn,
            )
            .unwrap();
        }

        let descriptions: Vec<String> = get_all_transactions(&conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.description)
            .collect();

        assert_eq!(descriptions, vec!["c", "b", "a"]);
    }

    #[test]
    fn get_count() {
        let conn = get_test_connection();
        let today = date!(2025 - 10 - 05);
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                Transaction::build(i as f64, today, "", TransactionKind::Expense),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(&conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
