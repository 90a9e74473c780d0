//! Defines the endpoint for downloading a user's transactions as CSV.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use csv::Writer;
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::{UserID, UserQuery, authorize_user},
    extract::QueryParams,
    transaction::{
        Transaction, TransactionType,
        core::{format_stored_date, get_transactions_by_user},
    },
};

/// The state needed to export transactions.
#[derive(Debug, Clone)]
pub struct ExportTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A CSV row. Transaction and user IDs are left out of exports.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    description: &'a str,
    category: &'a str,
    amount: f64,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    date: String,
}

/// A route handler that responds with the user's transactions as a CSV attachment.
///
/// # Errors
///
/// Responds with 404 Not Found if the user has no transactions, in addition
/// to the `userId` checks done for listing transactions.
pub async fn export_transactions_endpoint(
    State(state): State<ExportTransactionsState>,
    Extension(session_user_id): Extension<UserID>,
    QueryParams(query): QueryParams<UserQuery>,
) -> Result<Response, Error> {
    let user_id = authorize_user(session_user_id, query.user_id)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_transactions_by_user(user_id, &connection)?
    };

    if transactions.is_empty() {
        tracing::debug!("User {user_id} has no transactions to export");
        return Err(Error::NotFound);
    }

    let csv = write_csv(&transactions)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

fn write_csv(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = Writer::from_writer(vec![]);

    for transaction in transactions {
        writer
            .serialize(ExportRow {
                description: &transaction.description,
                category: &transaction.category,
                amount: transaction.amount,
                transaction_type: transaction.transaction_type,
                date: format_stored_date(transaction.date)?,
            })
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
