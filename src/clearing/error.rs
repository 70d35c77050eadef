//! Interbank transfer errors
//!
//! Everything the coordinator can surface to an API caller. Each variant
//! carries a stable code and an HTTP status suggestion; raw internal detail
//! stays in the log.

use thiserror::Error;

use super::protocol::RejectReason;
use crate::account::ValidationError;

#[derive(Debug, Clone, Error)]
pub enum InterbankError {
    // === Validation (rejected before any network interaction) ===
    #[error("Invalid account identifier: {0}")]
    InvalidAccount(#[from] ValidationError),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Source account is not held at this bank")]
    SourceNotLocal,

    #[error("Destination account is held at this bank; use an internal transfer")]
    DestinationNotForeign,

    // === Authorization ===
    #[error("Source account not found")]
    SourceAccountNotFound,

    #[error("Source account does not belong to the caller")]
    NotAccountOwner,

    #[error("Source account does not permit debit")]
    DebitNotPermitted,

    #[error("Source account does not hold the requested currency")]
    CurrencyMismatch,

    // === Connectivity ===
    #[error("Clearing channel is not connected")]
    ChannelDown,

    // === Terminal protocol outcomes ===
    #[error("Transfer rejected: {0}")]
    Rejected(RejectReason),

    #[error("Timed out waiting for confirmation; the final outcome is unknown")]
    Timeout,

    // === Internal ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InterbankError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            InterbankError::InvalidAccount(_) => "INVALID_ACCOUNT",
            InterbankError::InvalidAmount => "INVALID_AMOUNT",
            InterbankError::SourceNotLocal => "SOURCE_NOT_LOCAL",
            InterbankError::DestinationNotForeign => "DESTINATION_NOT_FOREIGN",
            InterbankError::SourceAccountNotFound => "SOURCE_ACCOUNT_NOT_FOUND",
            InterbankError::NotAccountOwner => "FORBIDDEN",
            InterbankError::DebitNotPermitted => "ACCOUNT_NO_DEBIT",
            InterbankError::CurrencyMismatch => "CURRENCY_NOT_SUPPORTED",
            InterbankError::ChannelDown => "COORDINATOR_UNAVAILABLE",
            InterbankError::Rejected(reason) => reason.code(),
            InterbankError::Timeout => "TIMEOUT",
            InterbankError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            InterbankError::InvalidAccount(_)
            | InterbankError::InvalidAmount
            | InterbankError::SourceNotLocal
            | InterbankError::DestinationNotForeign => 400,
            InterbankError::NotAccountOwner => 403,
            InterbankError::SourceAccountNotFound
            | InterbankError::DebitNotPermitted
            | InterbankError::CurrencyMismatch => 422,
            InterbankError::Rejected(_) | InterbankError::Timeout => 409,
            InterbankError::ChannelDown => 503,
            InterbankError::Internal(_) => 500,
        }
    }
}
