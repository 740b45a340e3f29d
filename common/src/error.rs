//! Error types for wallet ledger operations.

use crate::identifiers::WalletId;
use crate::monetary::{Amount, Balance};
use thiserror::Error;

/// Main error type for wallet ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No wallet row matches the identifier.
    #[error("wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// A withdrawal would drive the balance negative. The transaction that
    /// computed the tentative balance is rolled back before this is raised.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Amount,
        available: Balance,
    },

    /// Any transaction-begin, query, or commit failure in the backing store.
    /// Never retried by the core; retry policy belongs to the caller.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Wrap an underlying storage error, keeping its text for logging.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Get a stable error code for client-facing error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

/// Result type alias for wallet ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
