//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Reject duplicate (method, pattern) registrations
//! - Look up the matching route for a request, or report an explicit NotFound
//!
//! # Design Decisions
//! - Built once at startup, then shared read-only behind `Arc`
//! - O(n) scan over routes (acceptable for typical route counts)
//! - Most specific match wins; ties go to the earliest registration

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::{BoxFuture, FutureExt};
use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::http::{HandlerError, RequestContext, Response};
use crate::routing::matcher::{split_path, PathPattern};
use crate::routing::RouteError;

/// Future returned by a type-erased handler.
pub type HandlerFuture = BoxFuture<'static, Result<Response, HandlerError>>;

/// Type-erased request handler.
pub type Handler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// A registered (method, pattern, handler) triple.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .finish_non_exhaustive()
    }
}

/// Result of a successful lookup. Lives only for the duration of one dispatch.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    route: &'a Route,
    path_params: HashMap<String, String>,
}

impl<'a> RouteMatch<'a> {
    pub fn route(&self) -> &'a Route {
        self.route
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    pub fn into_path_params(self) -> HashMap<String, String> {
        self.path_params
    }
}

/// No route matched the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no route matches {method} {path}")]
pub struct NotFound {
    pub method: Method,
    pub path: String,
}

/// Ordered collection of routes.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` and `pattern`.
    pub fn register<F, Fut>(&mut self, method: Method, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        let pattern = PathPattern::parse(pattern)?;

        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.method == method && r.pattern.same_shape(&pattern))
        {
            return Err(RouteError::Duplicate {
                method,
                pattern: existing.pattern.to_string(),
            });
        }

        tracing::debug!(method = %method, pattern = %pattern, "Route registered");

        let handler: Handler = Arc::new(move |ctx| handler(ctx).boxed());
        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Register a `GET` route.
    pub fn get<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        self.register(Method::GET, pattern, handler)
    }

    /// Register a `POST` route.
    pub fn post<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
    {
        self.register(Method::POST, pattern, handler)
    }

    /// Find the route for `method` and `path`.
    ///
    /// `path` must not include the query string. Parameter values are percent-decoded;
    /// a path that does not decode to UTF-8 matches nothing.
    pub fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, NotFound> {
        let not_found = || NotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let segments = split_path(path)
            .into_iter()
            .map(|s| percent_decode_str(s).decode_utf8())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| not_found())?;

        let mut best: Option<(&Route, Vec<(String, String)>)> = None;
        for route in self.routes.iter().filter(|r| &r.method == method) {
            let Some(params) = route.pattern.match_segments(&segments) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((current, _)) => route.pattern.specificity_cmp(&current.pattern).is_gt(),
            };
            if better {
                best = Some((route, params));
            }
        }

        best.map(|(route, params)| RouteMatch {
            route,
            path_params: params.into_iter().collect(),
        })
        .ok_or_else(not_found)
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn ok(_ctx: RequestContext) -> Result<Response, HandlerError> {
        Ok(Response::new(StatusCode::OK))
    }

    fn table(routes: &[(Method, &str)]) -> RouteTable {
        let mut table = RouteTable::new();
        for (method, pattern) in routes {
            table.register(method.clone(), pattern, ok).unwrap();
        }
        table
    }

    fn matched_pattern(table: &RouteTable, method: Method, path: &str) -> String {
        table.lookup(&method, path).unwrap().route().pattern().to_string()
    }

    #[test]
    fn test_exact_lookup_returns_registered_route() {
        let patterns = ["/transfer", "/withdrawal", "/withdrawal/status/{id}", "/account/{id}"];
        let table = table(&patterns.map(|p| (Method::POST, p)));

        for pattern in patterns {
            assert_eq!(matched_pattern(&table, Method::POST, pattern), pattern);
        }
    }

    #[test]
    fn test_escaped_literal_matches_its_own_path() {
        let table = table(&[(Method::GET, "/files/a%20b")]);
        assert_eq!(matched_pattern(&table, Method::GET, "/files/a%20b"), "/files/a%20b");
        assert_eq!(matched_pattern(&table, Method::GET, "/files/a b"), "/files/a%20b");
        assert!(table.lookup(&Method::GET, "/files/a%2520b").is_err());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut table = table(&[(Method::GET, "/account/{accountId}")]);

        let err = table.get("/account/{id}", ok).unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { ref pattern, .. } if pattern == "/account/{accountId}"));

        // Same pattern under another method is fine.
        table.post("/account/{accountId}", ok).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_method_mismatch_is_not_found() {
        let table = table(&[(Method::POST, "/transfer")]);
        let err = table.lookup(&Method::GET, "/transfer").unwrap_err();
        assert_eq!(err.method, Method::GET);
        assert_eq!(err.path, "/transfer");
    }

    #[test]
    fn test_path_params_are_extracted_and_decoded() {
        let table = table(&[(Method::GET, "/account/{accountId}")]);
        let matched = table.lookup(&Method::GET, "/account/hello%20world").unwrap();
        assert_eq!(matched.path_params().get("accountId").map(String::as_str), Some("hello world"));
    }

    #[test]
    fn test_invalid_utf8_path_is_not_found() {
        let table = table(&[(Method::GET, "/account/{accountId}")]);
        assert!(table.lookup(&Method::GET, "/account/%FF").is_err());
    }

    #[test]
    fn test_literal_beats_param_regardless_of_order() {
        let table = table(&[
            (Method::GET, "/withdrawal/{id}"),
            (Method::GET, "/withdrawal/pending"),
        ]);
        assert_eq!(matched_pattern(&table, Method::GET, "/withdrawal/pending"), "/withdrawal/pending");
        assert_eq!(matched_pattern(&table, Method::GET, "/withdrawal/abc"), "/withdrawal/{id}");
    }

    #[test]
    fn test_positional_preference_for_literals() {
        let table = table(&[(Method::GET, "/a/{x}/c"), (Method::GET, "/a/b/{y}")]);
        assert_eq!(matched_pattern(&table, Method::GET, "/a/b/c"), "/a/b/{y}");
    }

    #[test]
    fn test_trailing_slash_matches() {
        let table = table(&[(Method::GET, "/health")]);
        assert!(table.lookup(&Method::GET, "/health/").is_ok());
        assert!(table.lookup(&Method::GET, "/healthz").is_err());
    }
}
