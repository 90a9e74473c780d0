use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error, auth::UserID, database_id::TransactionId, extract::PathParams,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the logged in user's transactions.
///
/// Deleting a transaction that does not exist, or belongs to someone else,
/// succeeds without changing anything.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParams(transaction_id): PathParams<TransactionId>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_transaction(transaction_id, user_id, &connection)? {
        0 => tracing::debug!(
            "User {user_id} deleted transaction {transaction_id}, which did not exist for them"
        ),
        _ => tracing::debug!("User {user_id} deleted transaction {transaction_id}"),
    }

    Ok(Json(json!({ "message": "Deleted successfully" })))
}

type RowsAffected = usize;

fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id.as_i64())],
        )
        .map_err(|err| err.into())
}
