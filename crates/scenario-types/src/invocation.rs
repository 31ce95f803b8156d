//! Captured results of side-effecting chain calls.
//!
//! A chain collaborator never raises across the dispatch boundary. Every
//! deploy or send comes back as an [`Invocation`]: either the produced value
//! with its receipt, or the error that stopped it. Builders inspect the
//! invocation and turn a failure back into a propagated error.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Transaction receipt metadata attached to a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the transaction.
    pub tx_hash: B256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Sender of the transaction.
    pub from: Address,
    /// Call target, absent for contract creation.
    pub to: Option<Address>,
    /// Created contract, present only for deployments.
    pub contract_address: Option<Address>,
}

/// Why a side-effecting call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum InvocationError {
    /// The chain could not be reached or rejected the request.
    #[error("network error: {0}")]
    Network(String),

    /// The transaction executed and reverted.
    #[error("`{method}` reverted: {reason}")]
    Reverted {
        /// Constructor or method name that reverted.
        method: String,
        /// Revert reason reported by the chain.
        reason: String,
    },

    /// The fetcher handler itself failed before or after the chain call.
    #[error("handler failed: {0}")]
    Handler(String),
}

/// The outcome of a side-effecting call: a value or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Invocation<T> {
    /// The call succeeded.
    Success {
        /// Value produced by the call.
        value: T,
        /// Receipt of the transaction, when one was sent.
        receipt: Option<Receipt>,
    },
    /// The call failed.
    Failure {
        /// What went wrong.
        error: InvocationError,
    },
}

impl<T> Invocation<T> {
    /// A successful invocation.
    pub const fn success(value: T, receipt: Option<Receipt>) -> Self {
        Self::Success { value, receipt }
    }

    /// A failed invocation.
    pub const fn failure(error: InvocationError) -> Self {
        Self::Failure { error }
    }

    /// Whether the call succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The produced value, if the call succeeded.
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// The error, if the call failed.
    pub const fn error(&self) -> Option<&InvocationError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// The transaction receipt, if the call succeeded and sent one.
    pub const fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Success { receipt, .. } => receipt.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    /// Transform the success value, keeping the receipt.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Invocation<U> {
        match self {
            Self::Success { value, receipt } => Invocation::Success {
                value: f(value),
                receipt,
            },
            Self::Failure { error } => Invocation::Failure { error },
        }
    }

    /// Convert into a `Result`, dropping the receipt.
    pub fn into_result(self) -> Result<T, InvocationError> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure { error } => Err(error),
        }
    }
}

impl<T> From<Result<Invocation<T>, InvocationError>> for Invocation<T> {
    fn from(result: Result<Invocation<T>, InvocationError>) -> Self {
        result.unwrap_or_else(Self::failure)
    }
}

/// Handle to a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInstance {
    /// On-chain address of the contract.
    pub address: Address,
    /// Artifact name the contract was deployed from.
    pub contract: String,
}

impl ContractInstance {
    /// Create a handle for `contract` deployed at `address`.
    pub fn new(address: Address, contract: impl Into<String>) -> Self {
        Self {
            address,
            contract: contract.into(),
        }
    }
}
