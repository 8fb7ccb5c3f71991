//! Withdrawal processing seam.
//!
//! # Responsibilities
//! - Define the interface to whatever actually moves money out
//! - Provide an in-memory stand-in that settles requests after a random delay
//!
//! # Design Decisions
//! - Calls are synchronous; the transfer ledger holds its lock across a
//!   submission so a failed submission never leaves a debit behind
//! - Submitting the same id twice with identical details is accepted

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::config::WithdrawalConfig;
use crate::transfers::{Address, Amount, WithdrawalId, WithdrawalState};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WithdrawalError {
    #[error("Withdrawal request with id {0} is already present")]
    AlreadyPresent(WithdrawalId),

    #[error("Withdrawal request {0} is not found")]
    NotFound(WithdrawalId),
}

/// Executes withdrawals to external addresses.
pub trait WithdrawalService: Send + Sync {
    /// Submit a withdrawal. The service owns it from here on.
    fn request_withdrawal(
        &self,
        id: WithdrawalId,
        address: &Address,
        amount: Amount,
    ) -> Result<(), WithdrawalError>;

    /// Current state of a submitted withdrawal.
    fn request_state(&self, id: WithdrawalId) -> Result<WithdrawalState, WithdrawalError>;
}

#[derive(Debug, Clone)]
struct StubRequest {
    address: Address,
    amount: Amount,
    final_state: WithdrawalState,
    finalise_at: Instant,
}

/// In-memory withdrawal service that completes or fails each request at random.
#[derive(Debug)]
pub struct WithdrawalServiceStub {
    requests: DashMap<WithdrawalId, StubRequest>,
    min_settle: Duration,
    max_settle: Duration,
}

impl WithdrawalServiceStub {
    pub fn new(min_settle: Duration, max_settle: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            min_settle,
            max_settle: max_settle.max(min_settle),
        }
    }

    pub fn from_config(config: &WithdrawalConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_settle_ms),
            Duration::from_millis(config.max_settle_ms),
        )
    }

    fn settle_delay(&self) -> Duration {
        let min = self.min_settle.as_millis() as u64;
        let max = self.max_settle.as_millis() as u64;
        Duration::from_millis(fastrand::u64(min..=max))
    }

    fn final_state() -> WithdrawalState {
        if fastrand::bool() {
            WithdrawalState::Completed
        } else {
            WithdrawalState::Failed
        }
    }
}

impl Default for WithdrawalServiceStub {
    fn default() -> Self {
        Self::from_config(&WithdrawalConfig::default())
    }
}

impl WithdrawalService for WithdrawalServiceStub {
    fn request_withdrawal(
        &self,
        id: WithdrawalId,
        address: &Address,
        amount: Amount,
    ) -> Result<(), WithdrawalError> {
        match self.requests.entry(id) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.address == *address && existing.amount == amount {
                    Ok(())
                } else {
                    Err(WithdrawalError::AlreadyPresent(id))
                }
            }
            Entry::Vacant(slot) => {
                let request = StubRequest {
                    address: address.clone(),
                    amount,
                    final_state: Self::final_state(),
                    finalise_at: Instant::now() + self.settle_delay(),
                };
                tracing::debug!(
                    withdrawal_id = %id,
                    address = %address,
                    amount = %amount,
                    final_state = request.final_state.as_str(),
                    "Withdrawal accepted"
                );
                slot.insert(request);
                Ok(())
            }
        }
    }

    fn request_state(&self, id: WithdrawalId) -> Result<WithdrawalState, WithdrawalError> {
        let request = self.requests.get(&id).ok_or(WithdrawalError::NotFound(id))?;
        if request.finalise_at <= Instant::now() {
            Ok(request.final_state)
        } else {
            Ok(WithdrawalState::Processing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address("addr-1".into())
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let stub = WithdrawalServiceStub::default();
        let id = WithdrawalId::new();
        assert_eq!(stub.request_state(id), Err(WithdrawalError::NotFound(id)));
    }

    #[test]
    fn test_processing_until_delay_elapses() {
        let stub = WithdrawalServiceStub::new(Duration::from_secs(3600), Duration::from_secs(3600));
        let id = WithdrawalId::new();
        stub.request_withdrawal(id, &address(), Amount::from_minor_units(100)).unwrap();
        assert_eq!(stub.request_state(id), Ok(WithdrawalState::Processing));
    }

    #[test]
    fn test_zero_delay_is_final_immediately() {
        let stub = WithdrawalServiceStub::new(Duration::ZERO, Duration::ZERO);
        let id = WithdrawalId::new();
        stub.request_withdrawal(id, &address(), Amount::from_minor_units(100)).unwrap();
        assert!(stub.request_state(id).unwrap().is_final());
    }

    #[test]
    fn test_resubmission_requires_identical_details() {
        let stub = WithdrawalServiceStub::default();
        let id = WithdrawalId::new();
        let amount = Amount::from_minor_units(100);
        stub.request_withdrawal(id, &address(), amount).unwrap();

        assert_eq!(stub.request_withdrawal(id, &address(), amount), Ok(()));
        assert_eq!(
            stub.request_withdrawal(id, &Address("elsewhere".into()), amount),
            Err(WithdrawalError::AlreadyPresent(id))
        );
        assert_eq!(
            stub.request_withdrawal(id, &address(), Amount::from_minor_units(1)),
            Err(WithdrawalError::AlreadyPresent(id))
        );
    }
}
