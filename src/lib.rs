//! A backend for tracking personal finances.
//!
//! The library provides a JSON API for logging transactions and categories,
//! and the job that turns recurring transactions into concrete transactions
//! once their dates come around.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod category;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod recurrence;
mod recurring;
mod routing;
mod scheduler;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use category::{
    Category, CategoryColor, CategoryName, create_category, get_all_categories, get_category,
};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurrence::{MAX_OCCURRENCES, RecurrencePattern, RecurrencePatternError, RecurrenceRule};
pub use recurring::{
    MaterializationSummary, RecurringTemplate, materialize_for_today,
    materialize_recurring_transactions,
};
pub use routing::build_router;
pub use scheduler::run_recurring_schedule;
pub use timezone::{get_local_offset, local_today};
pub use transaction::{
    NewRecurrence, Transaction, TransactionBuilder, TransactionForm, TransactionKind,
    count_transactions, create_transaction, get_all_transactions, get_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The transaction form failed validation.
    ///
    /// The string describes which rule was broken and is safe to show to the client.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The category ID used to create a transaction did not match a valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The request body for a new category could not be read.
    #[error("invalid category: {0}")]
    InvalidCategoryForm(String),

    /// A category name was empty or too long.
    #[error("invalid category name: {0}")]
    InvalidCategoryName(String),

    /// A category color was not a hex color code such as "#1A2B3C".
    #[error("\"{0}\" is not a valid hex color code")]
    InvalidCategoryColor(String),

    /// The specified category name already exists in the database.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to deactivate a recurring transaction that does not exist or is
    /// no longer recurring.
    #[error("tried to deactivate a recurring transaction that is not in the database")]
    DeactivateMissingTemplate,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidTransaction(_)
            | Error::InvalidCategory(_)
            | Error::InvalidCategoryForm(_)
            | Error::InvalidCategoryName(_)
            | Error::InvalidCategoryColor(_)
            | Error::DuplicateCategoryName(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::DeactivateMissingTemplate => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::InvalidTimezoneError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // SQL errors are logged when they are converted, the details stay on the server.
            Error::SqlError(_) => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = Error::InvalidTransaction("amount must be positive".to_owned())
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_template_is_not_found() {
        let response = Error::DeactivateMissingTemplate.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn lock_error_is_internal_server_error() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
