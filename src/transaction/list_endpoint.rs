//! Defines the endpoint for listing a user's transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{UserID, UserQuery, authorize_user},
    extract::QueryParams,
    transaction::{Transaction, core::get_transactions_by_user},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the user's transactions, newest first.
///
/// # Errors
///
/// Responds with 400 Bad Request if `userId` is missing and 403 Forbidden if
/// it is not the logged in user.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(session_user_id): Extension<UserID>,
    QueryParams(query): QueryParams<UserQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let user_id = authorize_user(session_user_id, query.user_id)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions_by_user(user_id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        endpoints,
        test_utils::{get_logged_in_user, get_test_app_state, get_test_server},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    #[tokio::test]
    async fn lists_own_transactions_newest_first() {
        let state = get_test_app_state();
        let server = get_test_server(state.clone());
        let (user_id, cookie) = get_logged_in_user(&server, "test@example.com").await;
        let (other_user, _) = get_logged_in_user(&server, "other@example.com").await;
        let (older, newer) = {
            let connection = state.db_connection.lock().unwrap();
            let older = create_transaction(
                Transaction::build(user_id, 100.0, TransactionType::Income, "Salary")
                    .date(datetime!(2025-01-05 00:00 UTC)),
                &connection,
            )
            .unwrap();
            let newer = create_transaction(
                Transaction::build(user_id, 40.0, TransactionType::Expense, "Groceries")
                    .category("Food")
                    .date(datetime!(2025-01-06 00:00 UTC)),
                &connection,
            )
            .unwrap();
            create_transaction(
                Transaction::build(other_user, 1.0, TransactionType::Expense, "Not mine"),
                &connection,
            )
            .unwrap();
            (older, newer)
        };

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("userId", user_id.as_i64())
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>(), vec![newer, older]);
    }

    #[tokio::test]
    async fn lists_nothing_for_new_user() {
        let server = get_test_server(get_test_app_state());
        let (user_id, cookie) = get_logged_in_user(&server, "test@example.com").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("userId", user_id.as_i64())
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>(), vec![]);
    }

    #[tokio::test]
    async fn rejects_missing_user_id() {
        let server = get_test_server(get_test_app_state());
        let (_, cookie) = get_logged_in_user(&server, "test@example.com").await;

        server
            .get(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_non_numeric_user_id_with_json_error() {
        let server = get_test_server(get_test_app_state());
        let (_, cookie) = get_logged_in_user(&server, "test@example.com").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("userId", "abc")
            .add_cookie(cookie)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn rejects_other_users_id() {
        let server = get_test_server(get_test_app_state());
        let (_, cookie) = get_logged_in_user(&server, "test@example.com").await;
        let (other_user, _) = get_logged_in_user(&server, "other@example.com").await;

        server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("userId", other_user.as_i64())
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
