//! Domain types for accounts and withdrawals.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transfers::Amount;

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub balance: Amount,
}

/// Identifier of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawalId(pub Uuid);

impl WithdrawalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WithdrawalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WithdrawalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Destination of a withdrawal, opaque to this service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalState {
    Processing,
    Completed,
    Failed,
}

impl WithdrawalState {
    /// Completed and failed withdrawals never change again.
    pub fn is_final(self) -> bool {
        !matches!(self, WithdrawalState::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalState::Processing => "PROCESSING",
            WithdrawalState::Completed => "COMPLETED",
            WithdrawalState::Failed => "FAILED",
        }
    }
}

/// A withdrawal whose amount has been debited but not yet settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub sender: Uuid,
    pub address: Address,
    pub amount: Amount,
}

/// JSON body accepted by `POST /transfer`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_account_id: Uuid,
    pub receiver_account_id: Uuid,
    pub amount: Amount,
}

/// JSON body accepted by `POST /withdrawal`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub sender_account_id: Uuid,
    pub address: String,
    pub amount: Amount,
}

/// JSON body accepted by `POST /account`. A missing id is generated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub balance: Amount,
}
