//! Authentication middleware that validates the session cookie and extends sessions.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde::{Deserialize, Deserializer, de};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        UserID,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    },
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid session cookie.
///
/// The user ID is placed into the request and the request executed normally
/// if the cookie is valid, otherwise a 401 Unauthorized JSON error is returned.
/// Each successful request pushes the session expiry out to at least
/// `cookie_duration` from now.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}.");
            return Error::Unauthenticated.into_response();
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// The `userId` query parameter of requests for a user's data.
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// The user whose data is requested.
    #[serde(rename = "userId", default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

/// Deserialize a `userId` given either as an integer or a string holding one.
///
/// Browsers keep the ID as a string, so `"1"` and `1` are the same user.
/// `null` and blank strings are treated as a missing ID.
pub(crate) fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(id)) => Ok(Some(id)),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("userId {text:?} is not an integer"))),
    }
}

/// Check that the `userId` a request asks for belongs to the logged in user.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingField] if `requested_user_id` is `None`,
/// - or [Error::Forbidden] if it refers to a different user than `session_user_id`.
pub fn authorize_user(
    session_user_id: UserID,
    requested_user_id: Option<i64>,
) -> Result<UserID, Error> {
    match requested_user_id {
        None => Err(Error::MissingField("userId")),
        Some(id) if id == session_user_id.as_i64() => Ok(session_user_id),
        Some(id) => {
            tracing::warn!("User {session_user_id} tried to access data for user {id}.");
            Err(Error::Forbidden)
        }
    }
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        http::StatusCode,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use sha2::Digest;
    use time::Duration;

    use crate::{
        Error,
        auth::{
            COOKIE_TOKEN, UserID, UserQuery, cookie::set_auth_cookie, middleware::authorize_user,
        },
    };

    use super::{AuthState, auth_guard};

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn stub_log_in_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(1), state.cookie_duration)
    }

    const TEST_LOG_IN_ROUTE: &str = "/log_in";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration,
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_cookie() {
        let server = get_test_server(Duration::minutes(5));
        let response = server.post(TEST_LOG_IN_ROUTE).await;
        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("1");
    }

    #[tokio::test]
    async fn get_protected_route_with_no_cookie() {
        let server = get_test_server(Duration::minutes(5));

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_cookie() {
        let server = get_test_server(Duration::minutes(5));

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_route_refreshes_cookie() {
        let server = get_test_server(Duration::minutes(5));
        let response = server.post(TEST_LOG_IN_ROUTE).await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        let refreshed_cookie = response.cookie(COOKIE_TOKEN);
        assert!(refreshed_cookie.expires_datetime().is_some());
    }

    #[test]
    fn authorize_user_accepts_own_id() {
        assert_eq!(authorize_user(UserID::new(1), Some(1)), Ok(UserID::new(1)));
    }

    #[test]
    fn authorize_user_rejects_missing_id() {
        assert_eq!(
            authorize_user(UserID::new(1), None),
            Err(Error::MissingField("userId"))
        );
    }

    #[test]
    fn authorize_user_rejects_other_users_id() {
        assert_eq!(
            authorize_user(UserID::new(1), Some(2)),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn user_query_accepts_numbers_and_numeric_strings() {
        for body in [r#"{"userId": 7}"#, r#"{"userId": "7"}"#, r#"{"userId": " 7 "}"#] {
            let query: UserQuery = serde_json::from_str(body).unwrap();

            assert_eq!(query.user_id, Some(7), "for {body}");
        }
    }

    #[test]
    fn user_query_treats_null_and_blank_as_missing() {
        for body in [r#"{}"#, r#"{"userId": null}"#, r#"{"userId": ""}"#] {
            let query: UserQuery = serde_json::from_str(body).unwrap();

            assert_eq!(query.user_id, None, "for {body}");
        }
    }

    #[test]
    fn user_query_rejects_non_numeric_ids() {
        for body in [r#"{"userId": "abc"}"#, r#"{"userId": 1.5}"#, r#"{"userId": true}"#] {
            assert!(serde_json::from_str::<UserQuery>(body).is_err(), "for {body}");
        }
    }
}
