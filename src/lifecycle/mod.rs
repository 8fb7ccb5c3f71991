//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Seed ledger → Routes → Bind listener → Metrics → Monitor → Server
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain connections (grace period) → Stop monitor
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then the listener, then background tasks
//! - Ordered shutdown: stop accept, drain, close
//! - Draining is bounded: after the grace period the server stops waiting and
//!   returns, leaving any remaining connections to end with the runtime

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_handler, wait_for_signal};
pub use startup::{Application, StartupError};
