//! Request and response types for dispatched API calls.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::Result;

/// Caller-supplied pieces of one dispatched API call.
///
/// Headers are merged into the outgoing request before the session attaches
/// its identity header, so callers cannot override it.
#[derive(Debug, Default, Clone)]
pub struct ApiRequest {
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach an extra header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the caller-supplied headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// The outcome of one dispatched API call.
///
/// The dispatcher returns every response with a status below 500 as-is,
/// including 4xx statuses; interpreting those is the caller's business.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    /// Create a response from a status and raw body bytes.
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON, requiring a success status first.
    ///
    /// Non-success statuses become [`ApiError::Status`], carrying the
    /// server's `message` field when the body has one.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if !self.status.is_success() {
            return Err(ApiError::Status {
                status: self.status.as_u16(),
                message: self.error_message(),
            }
            .into());
        }
        serde_json::from_slice(&self.body).map_err(|err| {
            ApiError::Decode {
                message: err.to_string(),
            }
            .into()
        })
    }

    fn error_message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
        value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: serde_json::Value) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            Bytes::from(serde_json::to_vec(&body).unwrap()),
        )
    }

    #[test]
    fn json_decodes_success_body() {
        let resp = response(200, json!({"customerGid": 42}));
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["customerGid"], 42);
    }

    #[test]
    fn json_rejects_error_status_with_message() {
        let resp = response(404, json!({"message": "no such device"}));
        let err = resp.json::<serde_json::Value>().unwrap_err();
        match err {
            crate::Error::Api(ApiError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("no such device"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn json_rejects_error_status_without_json_body() {
        let resp = ApiResponse::new(StatusCode::BAD_GATEWAY, Bytes::from_static(b"nope"));
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Api(ApiError::Status { status: 502, message: None })
        ));
    }

    #[test]
    fn caller_headers_round_trip() {
        let request = ApiRequest::new().with_header(
            http::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        assert_eq!(
            request.headers().get(http::header::ACCEPT).unwrap(),
            "application/json"
        );
    }
}
