//! Fluent HTTP scenarios against an axum router, without a server.
//!
//! # Example
//!
//! ```rust,ignore
//! use ledgergate::testing;
//! use serde_json::json;
//!
//! testing::post(app, &format!("/organizations/{}/accounts", org.id))
//!     .bearer_token(&tokens.for_user(&org.owner))
//!     .json_body(&json!({"name": "Checking"}))
//!     .execute()
//!     .await
//!     .assert_created()
//!     .assert_json_field("name", json!("Checking"));
//! ```

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tower::ServiceExt;

/// Test scenario builder for one request
pub struct Scenario {
    app: Router,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Body,
}

impl Scenario {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            method: Method::GET,
            uri: "/".to_string(),
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header. Panics on names or values `http` rejects.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_bytes(key.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    /// Set the Authorization header with Bearer token
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {token}"))
    }

    /// Append percent-encoded query parameters to the URI
    pub fn with_query(mut self, params: &[(&str, &str)]) -> Self {
        let encoded = serde_urlencoded::to_string(params).unwrap();
        let separator = if self.uri.contains('?') { '&' } else { '?' };
        self.uri = format!("{}{separator}{encoded}", self.uri);
        self
    }

    /// Set JSON body from a serializable type
    pub fn json_body<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Body::from(serde_json::to_vec(body).unwrap());
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self
    }

    /// Set a raw body, e.g. deliberately broken JSON
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Body::from(body.into());
        self
    }

    /// Execute the request and buffer the response for assertions
    pub async fn execute(self) -> ScenarioAssert {
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)
            .unwrap();
        *request.headers_mut() = self.headers;

        let response = self.app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        ScenarioAssert {
            status,
            headers,
            body,
        }
    }
}

/// Assertions over a buffered response
pub struct ScenarioAssert {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ScenarioAssert {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_created(self) -> Self {
        self.assert_status(StatusCode::CREATED)
    }

    pub fn assert_no_content(self) -> Self {
        self.assert_status(StatusCode::NO_CONTENT)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_forbidden(self) -> Self {
        self.assert_status(StatusCode::FORBIDDEN)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    pub fn assert_server_error(self) -> Self {
        self.assert_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn assert_header(self, key: &str, expected: &str) -> Self {
        let value = self
            .headers
            .get(key)
            .unwrap_or_else(|| panic!("Header '{key}' not found"))
            .to_str()
            .unwrap();
        assert_eq!(value, expected, "Header '{key}' value mismatch");
        self
    }

    pub fn assert_has_header(self, key: &str) -> Self {
        assert!(self.headers.contains_key(key), "Header '{key}' not found");
        self
    }

    /// Assert JSON field equals a value (`data.name`, `items.0.id`)
    pub fn assert_json_field(self, path: &str, expected: Value) -> Self {
        let json = self.json_value();
        let actual =
            json_path_get(&json, path).unwrap_or_else(|| panic!("Path '{path}' not found in {json}"));
        assert_eq!(actual, &expected, "JSON path '{path}' value mismatch");
        self
    }

    /// Assert an error body of the given `kind` and, if given, `reason`
    pub fn assert_error(self, kind: &str, reason: Option<&str>) -> Self {
        let json = self.json_value();
        assert_eq!(json["kind"], kind, "error kind mismatch in {json}");
        match reason {
            Some(reason) => assert_eq!(json["reason"], reason, "error reason mismatch in {json}"),
            None => assert!(json.get("reason").is_none(), "unexpected reason in {json}"),
        }
        assert!(json["error_id"].is_string(), "missing error_id in {json}");
        self
    }

    /// Assert a validation error names `field`, optionally with a message
    /// fragment
    pub fn assert_field_error(self, field: &str, message_part: Option<&str>) -> Self {
        let json = self.json_value();
        let errors = json["field_errors"]
            .as_array()
            .unwrap_or_else(|| panic!("no field_errors in {json}"));
        let found = errors.iter().any(|e| {
            e["field"] == field
                && message_part.is_none_or(|part| {
                    e["message"].as_str().is_some_and(|m| m.contains(part))
                })
        });
        assert!(found, "no error for field '{field}' in {json}");
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the JSON response body into a type
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    fn json_value(&self) -> Value {
        self.json()
    }
}

/// Simple JSON path getter (supports dot notation like "data.name" and array indexing like "items.0.id")
fn json_path_get<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(json, |current, part| match part.parse::<usize>() {
        Ok(index) => current.get(index),
        Err(_) => current.get(part),
    })
}

pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::GET).uri(uri)
}

pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

pub fn delete(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::DELETE).uri(uri)
}

pub fn patch(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::PATCH).uri(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, extract::RawQuery, routing::get as axum_get};
    use serde_json::json;

    async fn echo_query(RawQuery(query): RawQuery) -> Json<Value> {
        Json(json!({"query": query, "items": [{"id": 1}]}))
    }

    #[tokio::test]
    async fn test_query_params_are_encoded() {
        let app = Router::new().route("/echo", axum_get(echo_query));
        get(app, "/echo")
            .with_query(&[("q", "coffee shop"), ("limit", "5")])
            .execute()
            .await
            .assert_ok()
            .assert_json_field("query", json!("q=coffee+shop&limit=5"))
            .assert_json_field("items.0.id", json!(1));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = Router::new().route("/echo", axum_get(echo_query));
        get(app, "/missing").execute().await.assert_not_found();
    }

    #[test]
    fn test_json_path_get() {
        let value = json!({"a": {"b": [10, 20]}});
        assert_eq!(json_path_get(&value, "a.b.1"), Some(&json!(20)));
        assert_eq!(json_path_get(&value, "a.c"), None);
    }
}
