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
    summary::{Summary, summarise},
    timezone::get_timezone,
    transaction::get_transactions_by_user,
};

/// The state needed to summarise a user's transactions.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that responds with the [Summary] of a user's transactions.
///
/// # Errors
///
/// Responds with 400 Bad Request if `userId` is missing and 403 Forbidden if
/// it is not the logged in user.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(session_user_id): Extension<UserID>,
    QueryParams(query): QueryParams<UserQuery>,
) -> Result<Json<Summary>, Error> {
    let user_id = authorize_user(session_user_id, query.user_id)?;

    let local_timezone = get_timezone(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_transactions_by_user(user_id, &connection)?
    };

    Ok(Json(summarise(&transactions, local_timezone)))
}
