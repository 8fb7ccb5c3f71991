//! Account ledger and money movement.
//!
//! # Responsibilities
//! - Own every account balance and every unsettled withdrawal
//! - Validate and apply transfers between accounts
//! - Debit withdrawals up front and refund the ones that fail
//!
//! # Design Decisions
//! - One mutex guards accounts and pending withdrawals together, so every
//!   operation sees and leaves a consistent ledger
//! - A withdrawal is submitted before the sender is debited; a rejected
//!   submission leaves the balance untouched

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use uuid::Uuid;

use crate::http::HandlerError;
use crate::observability::metrics;
use crate::transfers::{
    Account, Address, Amount, Withdrawal, WithdrawalError, WithdrawalId, WithdrawalService,
    WithdrawalState,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Value must be greater than zero")]
    NonPositiveAmount,

    #[error("Account not found with given Id: {0}")]
    AccountNotFound(Uuid),

    /// Carries the operation name: "transfer" or "withdrawal".
    #[error("Insufficient balance for {0}")]
    InsufficientBalance(&'static str),

    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(Uuid),

    #[error(transparent)]
    Withdrawal(#[from] WithdrawalError),
}

impl From<TransferError> for HandlerError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::AccountNotFound(_)
            | TransferError::Withdrawal(WithdrawalError::NotFound(_)) => {
                HandlerError::NotFound(err.to_string())
            }
            TransferError::Withdrawal(WithdrawalError::AlreadyPresent(_)) => {
                HandlerError::Internal(err.to_string())
            }
            TransferError::NonPositiveAmount
            | TransferError::InsufficientBalance(_)
            | TransferError::BalanceOverflow(_) => HandlerError::BadRequest(err.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    accounts: HashMap<Uuid, Account>,
    pending: HashMap<WithdrawalId, Withdrawal>,
}

impl Ledger {
    fn account_mut(&mut self, id: Uuid) -> Result<&mut Account, TransferError> {
        self.accounts.get_mut(&id).ok_or(TransferError::AccountNotFound(id))
    }

    /// Apply a final state to a pending withdrawal. Returns false if nothing was settled.
    ///
    /// A failed withdrawal whose refund would overflow the sender's balance stays pending
    /// and is retried on the next check.
    fn settle(&mut self, id: WithdrawalId, state: WithdrawalState) -> bool {
        if !state.is_final() {
            return false;
        }
        let Some(&Withdrawal { sender, amount, .. }) = self.pending.get(&id) else {
            return false;
        };

        if state == WithdrawalState::Failed {
            match self.accounts.get_mut(&sender) {
                Some(account) => {
                    let Some(refunded) = account.balance.checked_add(amount) else {
                        tracing::error!(
                            withdrawal_id = %id,
                            account_id = %sender,
                            amount = %amount,
                            balance = %account.balance,
                            "Refund would overflow account balance, withdrawal kept pending"
                        );
                        return false;
                    };
                    account.balance = refunded;
                }
                None => tracing::warn!(
                    withdrawal_id = %id,
                    account_id = %sender,
                    "Refund target account no longer exists"
                ),
            }
        }

        let Some(withdrawal) = self.pending.remove(&id) else {
            return false;
        };

        tracing::info!(
            withdrawal_id = %id,
            account_id = %withdrawal.sender,
            amount = %withdrawal.amount,
            state = state.as_str(),
            "Withdrawal settled"
        );
        metrics::record_withdrawal_settled(state.as_str());
        true
    }
}

/// The in-memory ledger plus the withdrawal backend it submits to.
pub struct TransferService {
    ledger: Mutex<Ledger>,
    withdrawals: Arc<dyn WithdrawalService>,
}

impl TransferService {
    pub fn new(withdrawals: Arc<dyn WithdrawalService>) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            withdrawals,
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // Every mutation completes before it can panic, so a poisoned ledger is still consistent.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account, replacing any existing account with the same id.
    pub fn create_account(&self, id: Uuid, name: impl Into<String>, balance: Amount) -> Account {
        let account = Account {
            id,
            name: name.into(),
            balance,
        };
        self.ledger().accounts.insert(id, account.clone());
        tracing::debug!(account_id = %id, balance = %balance, "Account created");
        account
    }

    pub fn account(&self, id: Uuid) -> Result<Account, TransferError> {
        self.ledger()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(TransferError::AccountNotFound(id))
    }

    /// Move `amount` from `sender` to `receiver` atomically.
    pub fn transfer(&self, sender: Uuid, receiver: Uuid, amount: Amount) -> Result<(), TransferError> {
        if !amount.is_positive() {
            return Err(TransferError::NonPositiveAmount);
        }

        let mut ledger = self.ledger();
        let sender_balance = ledger.account_mut(sender)?.balance;
        let receiver_balance = ledger.account_mut(receiver)?.balance;

        if sender_balance < amount {
            return Err(TransferError::InsufficientBalance("transfer"));
        }
        if sender == receiver {
            return Ok(());
        }

        let debited = sender_balance
            .checked_sub(amount)
            .ok_or(TransferError::BalanceOverflow(sender))?;
        let credited = receiver_balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow(receiver))?;
        ledger.account_mut(sender)?.balance = debited;
        ledger.account_mut(receiver)?.balance = credited;

        tracing::info!(
            sender = %sender,
            receiver = %receiver,
            amount = %amount,
            "Transfer completed"
        );
        Ok(())
    }

    /// Submit a withdrawal of `amount` from `sender` to `address`, debiting the sender.
    pub fn withdraw(
        &self,
        sender: Uuid,
        address: Address,
        amount: Amount,
    ) -> Result<WithdrawalId, TransferError> {
        if !amount.is_positive() {
            return Err(TransferError::NonPositiveAmount);
        }

        let mut ledger = self.ledger();
        let balance = ledger.account_mut(sender)?.balance;
        if balance < amount {
            return Err(TransferError::InsufficientBalance("withdrawal"));
        }
        let debited = balance
            .checked_sub(amount)
            .ok_or(TransferError::BalanceOverflow(sender))?;

        let id = WithdrawalId::new();
        self.withdrawals.request_withdrawal(id, &address, amount)?;

        ledger.account_mut(sender)?.balance = debited;
        ledger.pending.insert(
            id,
            Withdrawal {
                id,
                sender,
                address,
                amount,
            },
        );

        tracing::info!(
            withdrawal_id = %id,
            sender = %sender,
            amount = %amount,
            "Withdrawal submitted"
        );
        Ok(id)
    }

    /// Current state of a withdrawal, settling it if it just reached a final state.
    pub fn withdrawal_status(&self, id: WithdrawalId) -> Result<WithdrawalState, TransferError> {
        let mut ledger = self.ledger();
        let state = self.withdrawals.request_state(id)?;
        ledger.settle(id, state);
        Ok(state)
    }

    /// Check every pending withdrawal once. Returns how many were settled.
    pub fn settle_pending(&self) -> usize {
        let mut ledger = self.ledger();
        let ids: Vec<WithdrawalId> = ledger.pending.keys().copied().collect();

        let mut settled = 0;
        for id in ids {
            match self.withdrawals.request_state(id) {
                Ok(state) => {
                    if ledger.settle(id, state) {
                        settled += 1;
                    }
                }
                Err(e) => tracing::warn!(withdrawal_id = %id, error = %e, "Status check failed"),
            }
        }
        settled
    }

    pub fn pending_count(&self) -> usize {
        self.ledger().pending.len()
    }
}
