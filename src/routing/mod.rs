//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (segment matching, parameter capture)
//!     → Return: RouteMatch or NotFound
//!
//! Route Registration (at startup):
//!     register(method, pattern, handler)
//!     → matcher.rs parses the pattern
//!     → duplicate (method, pattern) rejected
//!     → Table frozen behind Arc
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Most specific match wins, then registration order

use axum::http::Method;
use thiserror::Error;

pub mod matcher;
pub mod router;

pub use matcher::{PathPattern, Segment};
pub use router::{Handler, NotFound, Route, RouteMatch, RouteTable};

/// Errors raised while building the route table. Fatal at startup.
#[derive(Debug, Error)]
pub enum RouteError {
    /// An identical (method, pattern) pair is already registered.
    #[error("duplicate route: {method} {pattern} is already registered")]
    Duplicate { method: Method, pattern: String },

    /// The pattern could not be parsed.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },
}
