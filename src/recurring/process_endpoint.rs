//! The route handler for manually generating due recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, recurring::materialize::materialize_for_today};

/// The state needed to generate recurring transactions.
#[derive(Debug, Clone)]
pub struct ProcessRecurringState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ProcessRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The body of a successful run.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProcessRecurringResponse {
    /// Always `true`.
    pub success: bool,
    /// The number of recurring transactions that were considered.
    pub processed: usize,
    /// The number of transactions created.
    pub generated: usize,
    /// The number of due dates that already had a transaction.
    pub skipped: usize,
    /// A human readable summary of the run.
    pub message: String,
}

/// Generate the transactions that recurring transactions are due as of today.
///
/// Responds with the counts of the run, or with `{"success": false, "error": ...}`
/// and 500 Internal Server Error if the run failed.
pub async fn process_recurring_endpoint(State(state): State<ProcessRecurringState>) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        materialize_for_today(&state.db_connection, &state.local_timezone)
    })
    .await;

    let error = match result {
        Ok(Ok(summary)) => {
            return Json(ProcessRecurringResponse {
                success: true,
                processed: summary.processed,
                generated: summary.generated,
                skipped: summary.skipped,
                message: summary.message(),
            })
            .into_response();
        }
        Ok(Err(error)) => error.to_string(),
        Err(join_error) => {
            tracing::error!("Recurring transaction task failed: {join_error}");
            "the recurring transaction task failed".to_owned()
        }
    };

    tracing::error!("Could not process recurring transactions: {error}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}
