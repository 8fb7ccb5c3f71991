//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve a route for each request via the route table
//! - Extract path and query parameters into a `RequestContext`
//! - Invoke exactly one handler and turn its outcome into a response
//!
//! # Design Decisions
//! - Unknown routes become 404 without touching any handler
//! - Handler panics and internal errors become 500 and are logged with route and cause
//! - Dropping the dispatch future mid-handler is reported as a cancellation

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use futures_util::FutureExt;
use thiserror::Error;

use crate::http::{Request, RequestContext, Response};
use crate::observability::metrics;
use crate::routing::{NotFound, RouteTable};

/// Route label used for requests that matched nothing.
const UNMATCHED: &str = "unmatched";

/// Dispatch failures that are not the handler's own response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("handler for {method} {route} failed: {cause}")]
    Internal {
        method: Method,
        route: String,
        cause: String,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing response. Internal causes are not leaked.
    pub fn into_response(self) -> Response {
        let message = match self {
            DispatchError::NotFound(_) => "Not found",
            DispatchError::Internal { .. } => "Internal server error",
        };
        Response::error(self.status(), message)
    }
}

/// Matches requests to routes and runs their handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    cancelled: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self {
            routes,
            cancelled: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Requests abandoned before a response was produced, since startup.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Count a request whose peer went away. `route` labels the metric.
    pub fn record_cancelled(&self, route: &str) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        metrics::record_cancelled(route);
    }

    /// Dispatch a request, always producing a response.
    pub async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let (route, outcome) = self.run(request).await;
        let response = outcome.unwrap_or_else(DispatchError::into_response);

        metrics::record_request(method.as_str(), &route, response.status().as_u16(), start);
        response
    }

    /// Dispatch a request, surfacing NotFound and internal failures as errors.
    pub async fn try_dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        self.run(request).await.1
    }

    async fn run(&self, request: Request) -> (String, Result<Response, DispatchError>) {
        let method = request.method().clone();

        let matched = match self.routes.lookup(&method, request.path()) {
            Ok(matched) => matched,
            Err(not_found) => {
                tracing::debug!(
                    request_id = request.request_id().unwrap_or("unknown"),
                    method = %method,
                    path = %not_found.path,
                    "No route matched"
                );
                return (UNMATCHED.to_string(), Err(not_found.into()));
            }
        };

        let route = matched.route().pattern().to_string();
        let handler = Arc::clone(matched.route().handler());
        let query = parse_query(request.query());
        let request_id = request.request_id().unwrap_or("unknown").to_string();
        let ctx = RequestContext::new(request, matched.into_path_params(), query);

        let mut in_flight = InFlight::new(self, &method, &route);
        let outcome = AssertUnwindSafe(async move { (*handler)(ctx).await })
            .catch_unwind()
            .await;
        in_flight.finish();

        let result = match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) if err.is_internal() => Err(err.to_string()),
            Ok(Err(err)) => {
                tracing::debug!(
                    request_id = %request_id,
                    method = %method,
                    route = %route,
                    status = err.status().as_u16(),
                    error = %err,
                    "Handler rejected request"
                );
                Ok(err.into_response())
            }
            Err(panic) => Err(panic_message(panic.as_ref())),
        };

        let result = result.map_err(|cause| {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                route = %route,
                cause = %cause,
                "Handler failed"
            );
            metrics::record_handler_failure(&route);
            DispatchError::Internal {
                method: method.clone(),
                route: route.clone(),
                cause,
            }
        });

        (route, result)
    }
}

/// Parse a query string. The first occurrence of a repeated key wins.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
    }
    params
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

/// Reports a cancellation if dropped before `finish` is called.
struct InFlight<'a> {
    dispatcher: &'a Dispatcher,
    method: Method,
    route: String,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(dispatcher: &'a Dispatcher, method: &Method, route: &str) -> Self {
        Self {
            dispatcher,
            method: method.clone(),
            route: route.to_string(),
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(method = %self.method, route = %self.route, "Request cancelled before handler completed");
            self.dispatcher.record_cancelled(&self.route);
        }
    }
}
