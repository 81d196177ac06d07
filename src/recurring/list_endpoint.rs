//! The route handler for listing active recurring transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, recurring::template::get_recurring_templates};

/// The state needed to list recurring transactions.
#[derive(Debug, Clone)]
pub struct RecurringTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond with the active recurring transactions, newest first.
pub async fn get_recurring_transactions_endpoint(
    State(state): State<RecurringTransactionsState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_recurring_templates(&connection) {
        Ok(templates) => Json(templates).into_response(),
        Err(error) => {
            tracing::error!("Could not get recurring transactions: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints,
        recurrence::RecurrencePattern,
        recurring::RecurringTemplate,
        transaction::{NewRecurrence, Transaction, TransactionKind, create_transaction},
    };

    use super::{RecurringTransactionsState, get_recurring_transactions_endpoint};

    #[tokio::test]
    async fn lists_only_recurring_transactions() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_transaction(
            Transaction::build(4.0, date!(2025 - 01 - 01), "Snack", TransactionKind::Expense),
            &connection,
        )
        .unwrap();
        let rent = create_transaction(
            Transaction::build(900.0, date!(2025 - 01 - 01), "Rent", TransactionKind::Expense)
                .recurrence(Some(NewRecurrence {
                    pattern: RecurrencePattern::Monthly,
                    end_date: None,
                    occurrence_limit: Some(12),
                })),
            &connection,
        )
        .unwrap();
        let state = RecurringTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(
                endpoints::RECURRING_TRANSACTIONS,
                get(get_recurring_transactions_endpoint),
            )
            .with_state(state);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get(endpoints::RECURRING_TRANSACTIONS).await;

        response.assert_status_ok();
        let templates = response.json::<Vec<RecurringTemplate>>();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, rent.id);
        assert_eq!(templates[0].pattern, Some(RecurrencePattern::Monthly));
    }
}
