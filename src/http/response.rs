//! Response building.
//!
//! # Responsibilities
//! - Let handlers build a response incrementally (status, headers, body)
//! - Provide the JSON status envelope used by every endpoint
//! - Finalize into a wire response for the server
//!
//! # Design Decisions
//! - Bodies are fully buffered; responses here are small JSON documents
//! - Error bodies share one envelope: `{"status":"error","message":...,"data":null}`

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

use crate::http::codec::{self, CodecError, APPLICATION_JSON};

/// An outbound response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// A JSON response with the given status.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, CodecError> {
        let body = codec::encode(value)?;
        Ok(Self::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .with_body(body))
    }

    /// An error envelope with the given status and message.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        let envelope = StatusResponse::<()>::error(message);
        // The envelope only holds strings, so encoding cannot fail.
        Self::json(status, &envelope).unwrap_or_else(|_| Self::new(status))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Finalize into the wire representation.
    pub fn into_http(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Status envelope returned by the transfer endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> StatusResponse<T> {
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }
}

impl StatusResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_sets_content_type() {
        let response = Response::json(StatusCode::CREATED, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(&response.body()[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_error_envelope() {
        let response = Response::error(StatusCode::NOT_FOUND, "Not found");
        let envelope: StatusResponse<()> = codec::decode(response.body()).unwrap();
        assert_eq!(envelope, StatusResponse::error("Not found"));
        assert_eq!(&response.body()[..], br#"{"status":"error","message":"Not found","data":null}"#);
    }

    #[test]
    fn test_into_http_keeps_status_and_headers() {
        let response = Response::new(StatusCode::ACCEPTED)
            .with_header(HeaderName::from_static("x-test"), HeaderValue::from_static("1"))
            .into_http();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-test"], "1");
    }
}
