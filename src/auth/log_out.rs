//! Log-out route handler that invalidates the session cookie.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the session cookie.
///
/// Always succeeds, even if the client was not logged in.
pub async fn post_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "Logged out" }))).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::header::SET_COOKIE;
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};

    use crate::auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, cookie::set_auth_cookie};

    use super::post_log_out;

    fn get_jar() -> PrivateCookieJar {
        let key = Key::from(&Sha512::digest("42"));
        PrivateCookieJar::new(key)
    }

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let cookie_jar =
            set_auth_cookie(get_jar(), UserID::new(123), DEFAULT_COOKIE_DURATION).unwrap();

        let response = post_log_out(cookie_jar).await;

        assert!(response.status().is_success());
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_owned())
            .find(|value| value.starts_with(COOKIE_TOKEN))
            .expect("Missing auth cookie in response");
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
