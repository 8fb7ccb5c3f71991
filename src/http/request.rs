//! Request types handed to the dispatcher and to handlers.
//!
//! # Responsibilities
//! - Hold the parsed request (method, path, query, headers, body)
//! - Carry per-request path and query parameters to handlers
//! - Expose the request ID assigned by the server middleware
//!
//! # Design Decisions
//! - `Request` is immutable once built; handlers only see `&Request`
//! - The body is fully buffered before dispatch (bounded by `limits.max_body_size`)

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{header::HeaderName, request::Parts, HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;

use crate::http::codec::{self, CodecError};
use crate::http::HandlerError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// An inbound HTTP request with a buffered body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Start building a request for `method` and `path`. The path may carry a `?query`.
    pub fn new(method: Method, path: &str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (path.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build from the head of a wire request and its collected body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Header value as UTF-8, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

/// Everything a handler gets for one request.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    path_params: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(
        request: Request,
        path_params: HashMap<String, String>,
        query_params: HashMap<String, String>,
    ) -> Self {
        Self {
            request,
            path_params,
            query_params,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// A query parameter that must be present and non-empty.
    pub fn required_query(&self, name: &str) -> Result<&str, HandlerError> {
        match self.query_param(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(HandlerError::MissingParameter(name.to_string())),
        }
    }

    /// True when the request carries a non-blank body.
    pub fn has_body(&self) -> bool {
        self.request.body.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        codec::decode(&self.request.body)
    }
}
