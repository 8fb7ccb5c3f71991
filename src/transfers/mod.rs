//! Money transfer application.
//!
//! # Data Flow
//! ```text
//! handlers.rs (parse query/body, map errors to statuses)
//!     → service.rs (validate, move balances, track pending withdrawals)
//!     → withdrawal.rs (submit withdrawals, report their state)
//!
//! monitor.rs (every poll interval)
//!     → service.rs settle_pending (refund FAILED, drop COMPLETED)
//! ```
//!
//! # Design Decisions
//! - Amounts are fixed-point with two decimal places, never floats
//! - State is in memory only; a restart reloads the seed accounts

pub mod amount;
pub mod handlers;
pub mod monitor;
pub mod service;
pub mod types;
pub mod withdrawal;

pub use amount::{Amount, AmountParseError};
pub use handlers::routes;
pub use monitor::SettlementMonitor;
pub use service::{TransferError, TransferService};
pub use types::{
    Account, Address, CreateAccountRequest, TransferRequest, Withdrawal, WithdrawalId,
    WithdrawalRequest, WithdrawalState,
};
pub use withdrawal::{WithdrawalError, WithdrawalService, WithdrawalServiceStub};
