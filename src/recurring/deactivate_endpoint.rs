//! The route handler for stopping a recurring transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, database_id::TransactionId,
    recurring::template::deactivate_recurring_template,
};

/// The state needed to deactivate a recurring transaction.
#[derive(Debug, Clone)]
pub struct DeactivateRecurringState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeactivateRecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deactivating a recurring transaction, responds with
/// 204 No Content.
///
/// Transactions already generated from it are kept.
pub async fn deactivate_recurring_endpoint(
    State(state): State<DeactivateRecurringState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match deactivate_recurring_template(transaction_id, &connection) {
        Ok(()) => {
            tracing::info!("Deactivated recurring transaction {transaction_id}");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => {
            tracing::error!("Could not deactivate recurring transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
