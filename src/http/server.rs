//! HTTP server setup and connection serving.
//!
//! # Responsibilities
//! - Create the Axum router that hands every request to the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, security headers)
//! - Buffer request bodies up to `limits.max_body_size`
//! - Serve HTTP/1.1 and HTTP/2 connections from the bounded listener
//! - Drain in-flight connections on shutdown, bounded by the grace period
//!
//! # Design Decisions
//! - Routing is owned by our `RouteTable`; Axum contributes only the fallback
//!   handler and the tower middleware stack
//! - Malformed framing is answered by hyper itself with 400 before dispatch
//! - A body that fails mid-read means the peer is gone: the request is logged
//!   as cancelled and no handler runs

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::Router;
use http_body_util::LengthLimitError;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use hyper::body::Incoming;
use hyper::service::service_fn;
use tokio::sync::broadcast;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::{Dispatcher, Request, Response};
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::routing::RouteTable;

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP server for the transfer service.
pub struct HttpServer {
    app: Router,
    config: AppConfig,
    connections: ConnectionTracker,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a server that dispatches every request through `routes`.
    pub fn new(config: AppConfig, routes: RouteTable) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(routes)));
        let state = AppState {
            dispatcher: Arc::clone(&dispatcher),
            max_body_size: config.limits.max_body_size,
        };
        let app = Self::build_router(&config, state);
        Self {
            app,
            config,
            connections: ConnectionTracker::new(),
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let router = Router::new().fallback(dispatch_handler).with_state(state);

        let router = if config.security.enable_headers {
            router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router, for serving in-process.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Shared handle to the dispatcher, usable after `run` takes the server.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Number of client connections currently open.
    pub fn active_connections(&self) -> u64 {
        self.connections.active_count()
    }

    /// Run the accept loop until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let graceful = GracefulShutdown::new();
        let http = ConnBuilder::new(TokioExecutor::new());

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(ListenerError::Closed) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let guard = self.connections.track();
                    let app = self.app.clone();
                    let svc = service_fn(move |req: hyper::Request<Incoming>| app.clone().oneshot(req));
                    let conn = http.serve_connection(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn.into_owned());

                    tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(
                                connection_id = %guard.id(),
                                peer_addr = %peer_addr,
                                error = %e,
                                "Connection ended with error"
                            );
                        }
                        drop(permit);
                        drop(guard);
                    });
                }

                _ = shutdown.recv() => {
                    tracing::info!(
                        active_connections = self.connections.active_count(),
                        "Shutdown requested, draining connections"
                    );
                    break;
                }
            }
        }

        drop(listener);
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        if tokio::time::timeout(grace, graceful.shutdown()).await.is_err() {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                remaining = self.connections.active_count(),
                "Grace period elapsed with connections still open"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Buffer the body and dispatch through the route table.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(body) => body,
        Err(err) if is_length_limit(&err) => {
            tracing::debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                limit = state.max_body_size,
                "Request body too large"
            );
            return Response::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                .into_http();
        }
        Err(err) => {
            tracing::debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                error = %err,
                "Request cancelled while reading body"
            );
            state.dispatcher.record_cancelled("body");
            // The peer is gone; nobody reads this.
            return Response::error(StatusCode::BAD_REQUEST, "Incomplete request body").into_http();
        }
    };

    state
        .dispatcher
        .dispatch(Request::from_parts(parts, body))
        .await
        .into_http()
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
