//! The endpoint for logging in a user and starting a session.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{UserID, cookie::set_auth_cookie, user::get_user_by_email},
    extract::JsonBody,
};

/// The state needed to log in a user.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user when logging in.
///
/// There is no need for validation here since the email and password are
/// only compared against what is in the database. A missing field is
/// treated the same as a wrong one.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: Option<String>,
    /// Password entered during log-in.
    pub password: Option<String>,
}

/// The body of a successful log-in response.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The logged in user's ID.
    pub id: UserID,
    /// The logged in user's display name.
    pub name: String,
}

/// A route handler for logging in a user.
///
/// On success, responds with the user's ID and name and sets the session cookie.
///
/// # Errors
///
/// Responds with 401 Unauthorized if the email does not belong to a
/// registered user or the password is not correct.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    JsonBody(user_data): JsonBody<LogInData>,
) -> Result<Response, Error> {
    let (Some(email), Some(password)) = (user_data.email, user_data.password) else {
        return Err(Error::InvalidCredentials);
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    tracing::info!("User {} logged in", user.id);

    Ok((
        jar,
        Json(LogInResponse {
            id: user.id,
            name: user.name,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::{COOKIE_TOKEN, log_in::LogInResponse},
        endpoints,
        test_utils::{get_test_app_state, get_test_server, register_test_user},
    };

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server(get_test_app_state());
        let user_id = register_test_user(&server, "alice@example.com", "hunter2").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": "hunter2"}))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<LogInResponse>(),
            LogInResponse {
                id: user_id,
                name: "Test User".to_owned()
            }
        );
        assert!(!response.cookie(COOKIE_TOKEN).value().is_empty());
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_email() {
        let server = get_test_server(get_test_app_state());
        register_test_user(&server, "alice@example.com", "hunter2").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "bob@example.com", "password": "hunter2"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let server = get_test_server(get_test_app_state());
        register_test_user(&server, "alice@example.com", "hunter2").await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "alice@example.com", "password": "hunter3"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(get_test_app_state());
        register_test_user(&server, "alice@example.com", "hunter2").await;

        for body in [
            json!({}),
            json!({"email": "alice@example.com"}),
            json!({"password": "hunter2"}),
        ] {
            let response = server.post(endpoints::LOG_IN).json(&body).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            assert!(response.json::<Value>()["error"].is_string());
        }
    }

    #[tokio::test]
    async fn log_in_with_malformed_body_is_json_bad_request() {
        let server = get_test_server(get_test_app_state());

        let response = server.post(endpoints::LOG_IN).text("not json").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }
}
