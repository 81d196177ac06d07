//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{TransactionForm, core::create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction, responds with the created
/// transaction and 201 Created on success.
///
/// Recurring transactions are created through this endpoint as well; their
/// later occurrences are generated by the recurring transaction job.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    form: Result<Json<TransactionForm>, JsonRejection>,
) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            return Error::InvalidTransaction(rejection.body_text()).into_response();
        }
    };

    let builder = match form.validate() {
        Ok(builder) => builder,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_transaction(builder, &connection) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => {
            tracing::error!("Could not create transaction: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        db::initialize,
        endpoints,
        recurrence::RecurrencePattern,
        transaction::{Transaction, count_transactions},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn get_test_state() -> CreateTransactionState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: CreateTransactionState) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn creates_recurring_transaction() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": 1200.0,
                "description": "Rent",
                "date": "2025-01-15",
                "kind": "expense",
                "is_recurring": true,
                "recurrence_pattern": "monthly",
                "recurrence_count": 12
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert!(transaction.is_recurring);
        assert_eq!(
            transaction.recurrence_pattern,
            Some(RecurrencePattern::Monthly)
        );
        assert_eq!(transaction.recurrence_count, Some(12));
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(1)
        );
    }

    #[tokio::test]
    async fn rejects_recurring_transaction_without_end_condition() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": 15.0,
                "description": "Streaming",
                "date": "2025-01-15",
                "kind": "expense",
                "is_recurring": true,
                "recurrence_pattern": "monthly"
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["error"].as_str().is_some_and(|error| error.contains("end date")));
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn malformed_body_gets_json_error() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": "lots",
                "description": "Lunch",
                "date": "2025-01-15",
                "kind": "expense"
            }))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "amount": 15.0,
                "description": "Lunch",
                "date": "2025-01-15",
                "kind": "expense",
                "category_id": 99
            }))
            .await;

        response.assert_status_bad_request();
    }
}
