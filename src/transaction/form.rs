//! Validation of the data submitted for new transactions.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::CategoryId,
    recurrence::RecurrencePattern,
    transaction::{NewRecurrence, Transaction, TransactionBuilder, TransactionKind},
};

/// The longest allowed transaction description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
/// The largest number of repetitions a recurring transaction may be created with.
pub const MAX_RECURRENCE_COUNT: u32 = 365;

/// The data submitted for creating a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The amount of money, must be greater than zero.
    pub amount: f64,
    /// What the transaction was for.
    pub description: String,
    /// When the transaction happened, or first happens for recurring transactions.
    pub date: Date,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The category of the transaction.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Whether the transaction repeats.
    #[serde(default)]
    pub is_recurring: bool,
    /// How often the transaction repeats.
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// The last date the transaction may repeat on.
    #[serde(default)]
    pub recurrence_end_date: Option<Date>,
    /// How many times the transaction repeats.
    #[serde(default)]
    pub recurrence_count: Option<u32>,
}

impl TransactionForm {
    /// Check the form and turn it into a [TransactionBuilder].
    ///
    /// A recurring transaction needs a pattern and an end condition, either an
    /// end date after `date` or a repetition count between 1 and
    /// [MAX_RECURRENCE_COUNT]. The recurrence fields are ignored when
    /// `is_recurring` is false.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTransaction] describing the first rule that failed.
    pub fn validate(self) -> Result<TransactionBuilder, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(invalid("amount must be greater than zero"));
        }

        let description = self.description.trim();

        if description.is_empty() {
            return Err(invalid("description is required"));
        }

        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(invalid(&format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        let recurrence = if self.is_recurring {
            Some(self.recurrence()?)
        } else {
            None
        };

        Ok(
            Transaction::build(self.amount, self.date, description, self.kind)
                .category_id(self.category_id)
                .recurrence(recurrence),
        )
    }

    fn recurrence(&self) -> Result<NewRecurrence, Error> {
        let Some(pattern) = self.recurrence_pattern else {
            return Err(invalid("recurring transactions need a recurrence pattern"));
        };

        let occurrence_limit = self.recurrence_count.filter(|&count| count > 0);

        if self.recurrence_end_date.is_none() && occurrence_limit.is_none() {
            return Err(invalid(
                "recurring transactions need an end date or a number of repetitions",
            ));
        }

        if occurrence_limit.is_some_and(|count| count > MAX_RECURRENCE_COUNT) {
            return Err(invalid(&format!(
                "recurring transactions may repeat at most {MAX_RECURRENCE_COUNT} times"
            )));
        }

        if self
            .recurrence_end_date
            .is_some_and(|end_date| end_date <= self.date)
        {
            return Err(invalid(
                "the end date must be after the date of the transaction",
            ));
        }

        Ok(NewRecurrence {
            pattern,
            end_date: self.recurrence_end_date,
            occurrence_limit,
        })
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidTransaction(reason.to_owned())
}
