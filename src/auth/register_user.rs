//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{
        PasswordHash,
        user::{NewUser, create_user},
    },
    extract::JsonBody,
    validation::{optional_text, required_text},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used to hash the new user's password.
    pub password_hash_cost: u32,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body of a registration request.
///
/// Every field is optional here so that missing fields are reported as
/// validation errors by the handler rather than as deserialization failures.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: Option<String>,
    /// The email to log in with.
    pub email: Option<String>,
    /// Free-form contact details.
    pub contact: Option<String>,
    /// The raw password, hashed before it is stored.
    pub password: Option<String>,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created and the new user's ID.
///
/// # Errors
///
/// Responds with 400 Bad Request if the email or password is missing, or if
/// the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    JsonBody(form): JsonBody<RegisterForm>,
) -> Result<Response, Error> {
    let email = required_text(form.email, "email")?;
    let password = match form.password {
        Some(password) if !password.is_empty() => password,
        _ => return Err(Error::MissingField("password")),
    };

    let password_hash = PasswordHash::new(&password, state.password_hash_cost)?;

    let new_user = NewUser {
        name: optional_text(form.name),
        email,
        contact: optional_text(form.contact),
        password_hash,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let user = create_user(new_user, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user.id, "message": "User Registered" })),
    )
        .into_response())
}

#[cfg(test)]
mod register_user_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::{count_users, get_user_by_email},
        endpoints,
        test_utils::{get_test_app_state, get_test_server},
    };

    #[tokio::test]
    async fn register_creates_user_with_hashed_password() {
        let state = get_test_app_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "contact": "021 123 4567",
                "password": "hunter2"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("alice@example.com", &connection).unwrap();
        assert_eq!(body["id"], user.id.as_i64());
        assert_eq!(user.name, "Alice");
        assert_eq!(user.contact, "021 123 4567");
        assert_ne!(user.password_hash.as_ref(), "hunter2");
        assert!(user.password_hash.verify("hunter2").unwrap());
    }

    #[tokio::test]
    async fn register_fails_on_duplicate_email() {
        let state = get_test_app_state();
        let server = get_test_server(state.clone());
        let form = json!({"name": "Alice", "email": "alice@example.com", "password": "hunter2"});
        server
            .post(endpoints::REGISTER)
            .json(&form)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post(endpoints::REGISTER).json(&form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_users(&connection).unwrap(), 1);
    }

    #[tokio::test]
    async fn register_fails_on_missing_email() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"name": "Alice", "password": "hunter2"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(
            response.json::<Value>()["error"]
                .as_str()
                .unwrap()
                .contains("email")
        );
    }

    #[tokio::test]
    async fn register_fails_on_missing_password() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "alice@example.com"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
