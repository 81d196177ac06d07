//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState, Error,
    category::{create_category_endpoint, get_categories_endpoint},
    endpoints,
    recurring::{
        deactivate_recurring_endpoint, get_recurring_transactions_endpoint,
        process_recurring_endpoint,
    },
    transaction::{create_transaction_endpoint, get_transactions_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTIONS,
            get(get_recurring_transactions_endpoint),
        )
        .route(
            endpoints::PROCESS_RECURRING,
            post(process_recurring_endpoint),
        )
        .route(
            endpoints::RECURRING_TRANSACTION,
            delete(deactivate_recurring_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
