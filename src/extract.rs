//! Request extractors whose rejections are reported as JSON [Error]s.
//!
//! Use these in place of axum's `Json`, `Query` and `Path` extractors so that
//! malformed requests get a `400 {"error": ...}` response like every other
//! client error.

use axum::extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, PathRejection, QueryRejection},
};

use crate::Error;

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// The query string of a request.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);

/// The parameters captured from the request path.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParams<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidField("body", rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidField("query", rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidField("path", rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::Value;

    use super::{JsonBody, PathParams, QueryParams};

    #[derive(Deserialize)]
    struct Count {
        count: u32,
    }

    async fn echo_body(JsonBody(body): JsonBody<Count>) -> String {
        body.count.to_string()
    }

    async fn echo_query(QueryParams(query): QueryParams<Count>) -> String {
        query.count.to_string()
    }

    async fn echo_path(PathParams(count): PathParams<u32>) -> String {
        count.to_string()
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/body", get(echo_body))
            .route("/query", get(echo_query))
            .route("/path/{count}", get(echo_path));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn assert_json_bad_request(response: axum_test::TestResponse, field: &str) {
        response.assert_status(StatusCode::BAD_REQUEST);
        let error = response.json::<Value>()["error"]
            .as_str()
            .expect("error should be a string")
            .to_owned();
        assert!(error.contains(field), "{error:?} should name {field:?}");
    }

    #[tokio::test]
    async fn extracts_valid_requests() {
        let server = get_test_server();

        server
            .get("/body")
            .json(&serde_json::json!({"count": 3}))
            .await
            .assert_text("3");
        server
            .get("/query")
            .add_query_param("count", 4)
            .await
            .assert_text("4");
        server.get("/path/5").await.assert_text("5");
    }

    #[tokio::test]
    async fn wrong_json_type_is_json_bad_request() {
        let server = get_test_server();

        let response = server
            .get("/body")
            .json(&serde_json::json!({"count": "many"}))
            .await;

        assert_json_bad_request(response, "body");
    }

    #[tokio::test]
    async fn non_json_body_is_json_bad_request() {
        let server = get_test_server();

        let response = server.get("/body").text("count=3").await;

        assert_json_bad_request(response, "body");
    }

    #[tokio::test]
    async fn bad_query_is_json_bad_request() {
        let server = get_test_server();

        let response = server.get("/query").add_query_param("count", "abc").await;

        assert_json_bad_request(response, "query");
    }

    #[tokio::test]
    async fn bad_path_is_json_bad_request() {
        let server = get_test_server();

        let response = server.get("/path/abc").await;

        assert_json_bad_request(response, "path");
    }
}
