//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (from net::Listener)
//!     → server.rs (hyper connection, middleware, body buffering)
//!     → request.rs (method, path, query, headers, body)
//!     → dispatcher.rs (route lookup, parameters, handler invocation)
//!     → response.rs (status, headers, JSON envelope)
//!     → Send to client
//! ```

pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{DispatchError, Dispatcher};
pub use error::HandlerError;
pub use request::{Request, RequestContext, X_REQUEST_ID};
pub use response::{Response, StatusResponse};
pub use server::HttpServer;
