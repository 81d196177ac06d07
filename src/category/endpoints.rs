//! Route handlers for creating and listing categories.

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
    category::{
        CategoryColor, CategoryName,
        db::{create_category, get_all_categories},
        domain::CategoryForm,
    },
};

/// The state needed for managing categories.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category creation, responds with the category and 201 Created.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    form: Result<Json<CategoryForm>, JsonRejection>,
) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            return Error::InvalidCategoryForm(rejection.body_text()).into_response();
        }
    };

    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_response(),
    };

    let color = match CategoryColor::new(&form.color) {
        Ok(color) => color,
        Err(error) => return error.into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_category(name, form.kind, color, &connection) {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_response()
        }
    }
}

/// Respond with all categories ordered by name.
pub async fn get_categories_endpoint(State(state): State<CategoryEndpointState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => {
            tracing::error!("Could not get categories: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        category::{Category, CategoryName},
        db::initialize,
        endpoints,
        transaction::TransactionKind,
    };

    use super::{CategoryEndpointState, create_category_endpoint, get_categories_endpoint};

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = CategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(
                endpoints::CATEGORIES,
                get(get_categories_endpoint).post(create_category_endpoint),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_then_list_category() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .json(&json!({"name": "Salary", "kind": "income", "color": "#22C55E"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Category>();
        assert_eq!(created.name, CategoryName::new_unchecked("Salary"));
        assert_eq!(created.kind, TransactionKind::Income);

        let categories = server.get(endpoints::CATEGORIES).await.json::<Vec<Category>>();
        assert_eq!(categories, vec![created]);
    }

    #[tokio::test]
    async fn create_fails_on_invalid_color() {
        let server = get_test_server();

        server
            .post(endpoints::CATEGORIES)
            .json(&json!({"name": "Salary", "kind": "income", "color": "green"}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn malformed_body_gets_json_error() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .json(&json!({"name": "Bonus", "kind": "gift", "color": "#22C55E"}))
            .await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn create_fails_on_duplicate_name() {
        let server = get_test_server();
        let body = json!({"name": "Rent", "kind": "expense", "color": "#EF4444"});
        server
            .post(endpoints::CATEGORIES)
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(endpoints::CATEGORIES)
            .json(&body)
            .await
            .assert_status_bad_request();
    }
}
