//! Money transfer HTTP service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ http::HttpServer ──▶ http::Dispatcher ──▶ routing::RouteTable
//!                (bounded accept)   (hyper + tower)      (params, panics)      (most specific wins)
//!                                                                                     │
//!                                                                                     ▼
//!                                                  transfers::handlers ──▶ transfers::TransferService
//!                                                                                     │
//!                                    transfers::SettlementMonitor ──▶ WithdrawalService (stub)
//!
//!     Cross-cutting: config, observability (tracing + metrics), lifecycle (startup/shutdown)
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Application
pub mod transfers;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
