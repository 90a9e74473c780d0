#![allow(missing_docs)]

use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, auth::COOKIE_TOKEN, auth::UserID, build_router, endpoints};

/// bcrypt's minimum cost, so that tests do not spend their time hashing.
const TEST_PASSWORD_HASH_COST: u32 = 4;

pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, "42", "Etc/UTC")
        .expect("Could not create app state.")
        .with_password_hash_cost(TEST_PASSWORD_HASH_COST)
}

pub(crate) fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Register a user named "Test User" through the API.
pub(crate) async fn register_test_user(server: &TestServer, email: &str, password: &str) -> UserID {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({"name": "Test User", "email": email, "password": password}))
        .await;
    response.assert_status(StatusCode::CREATED);

    let id = response.json::<Value>()["id"]
        .as_i64()
        .expect("Registration response is missing the user ID");

    UserID::new(id)
}

/// Log in through the API and return the session cookie.
pub(crate) async fn log_in_test_user(
    server: &TestServer,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({"email": email, "password": password}))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_TOKEN)
}

/// Register and log in a fresh user with the given email.
pub(crate) async fn get_logged_in_user(
    server: &TestServer,
    email: &str,
) -> (UserID, Cookie<'static>) {
    let user_id = register_test_user(server, email, "hunter2").await;
    let cookie = log_in_test_user(server, email, "hunter2").await;

    (user_id, cookie)
}
