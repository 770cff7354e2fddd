//! Service-level errors.

use crate::lending::LendingAction;
use thiserror::Error;
use walletkit_chain::{InvocationError, WalletError};

/// Which step of a mutating action failed.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The ERC20 approval did not confirm; the action call was never sent.
    #[error("approval failed: {0}")]
    Approval(#[source] WalletError),

    /// The action call itself failed.
    #[error("{0}")]
    Submission(#[source] WalletError),
}

impl ActionError {
    /// Underlying wallet error.
    pub fn wallet_error(&self) -> &WalletError {
        match self {
            ActionError::Approval(e) | ActionError::Submission(e) => e,
        }
    }
}

/// Errors surfaced by the service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad request input.
    #[error("{0}")]
    Validation(String),

    /// Contract read failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// A lending action failed on-chain.
    #[error("{action} failed: {source}")]
    Action {
        action: LendingAction,
        #[source]
        source: ActionError,
    },

    /// Account snapshot could not be read.
    #[error("{0}")]
    Read(String),

    /// The wallet could not be brought up.
    #[error("wallet import failed: {0}")]
    WalletImport(String),

    /// Mint, transfer or funding failed.
    #[error("{0}")]
    Nft(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Build an action error, routing an unavailable wallet to `WalletImport`.
    pub fn action(action: LendingAction, source: ActionError) -> Self {
        match source.wallet_error() {
            WalletError::Unavailable(reason) => ServiceError::WalletImport(reason.clone()),
            _ => ServiceError::Action { action, source },
        }
    }

    /// Human-readable detail for response bodies.
    pub fn details(&self) -> String {
        match self {
            ServiceError::Action { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
