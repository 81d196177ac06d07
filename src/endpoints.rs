//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/recurring/{transaction_id}', use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to create and list categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to list active recurring transactions.
pub const RECURRING_TRANSACTIONS: &str = "/api/recurring";
/// The route to deactivate a recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{transaction_id}";
/// The route to generate the transactions that recurring transactions are due.
pub const PROCESS_RECURRING: &str = "/api/recurring/process";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/recurring/{transaction_id}', '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::COFFEE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::RECURRING_TRANSACTIONS);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::RECURRING_TRANSACTION, 1));
        assert_endpoint_is_valid_uri(endpoints::PROCESS_RECURRING);
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::RECURRING_TRANSACTION, 42),
            "/api/recurring/42"
        );
    }

    #[test]
    fn format_endpoint_replaces_parameter_in_middle() {
        assert_eq!(format_endpoint("/foo/{bar_id}/baz", 7), "/foo/7/baz");
    }

    #[test]
    fn format_endpoint_without_parameter_is_unchanged() {
        assert_eq!(
            format_endpoint(endpoints::TRANSACTIONS, 1),
            endpoints::TRANSACTIONS
        );
    }
}
