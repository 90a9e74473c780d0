//! Tally is a web service for tracking personal income and expenses.
//!
//! This library provides a JSON REST API for registering users, recording
//! transactions and summarising them as totals, a running balance and a
//! breakdown of expenses by category.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod extract;
mod logging;
mod not_found;
mod routing;
mod summary;
mod timezone;
mod transaction;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    NewUser, PasswordHash, User, UserID, count_users, create_user, delete_user,
    get_user_by_email, get_user_by_id,
};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use summary::{
    BalancePoint, Summary, Totals, calculate_category_breakdown, calculate_running_balance,
    calculate_totals, summarise,
};
pub use timezone::{Tz, get_timezone};
pub use transaction::{
    Transaction, TransactionBuilder, TransactionType, create_transaction, get_transaction,
    get_transactions_by_user,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing from the request.
    ///
    /// The client should resend the request with the named field set.
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// A field in the request could not be interpreted.
    ///
    /// The first value is the field name and the second explains what was
    /// wrong with it.
    #[error("invalid value for \"{0}\": {1}")]
    InvalidField(&'static str, String),

    /// The email used to register a user already belongs to another user.
    #[error("a user with that email already exists")]
    DuplicateEmail,

    /// The email and password pair did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired session cookie.
    #[error("you must be logged in to access this resource")]
    Unauthenticated,

    /// The request tried to access another user's data.
    #[error("you do not have access to this resource")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be written to the auth cookie.
    #[error("could not encode session token: {0}")]
    TokenError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Writing transactions out as CSV failed.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingField(_) | Error::InvalidField(_, _) | Error::DuplicateEmail => {
                StatusCode::BAD_REQUEST
            }
            Error::InvalidCredentials | Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::CsvError(_)
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            // Internal details are for the server logs only.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
