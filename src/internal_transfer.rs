//! Internal transfers (both accounts at this bank)
//!
//! The simple case: no clearinghouse, no correlation, no suspension beyond
//! the single ledger call. The store debits the origin and credits the
//! destination in one indivisible operation, so a concurrent reader never
//! sees one leg without the other.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;

use crate::account::{AccountNumber, Currency, ValidationError};
use crate::ledger::{LedgerAdapter, LedgerError};

const MAX_DESCRIPTION_LEN: usize = 255;

/// Movement kind recorded with the ledger rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Between two accounts of the same customer
    Own,
    /// To another customer of this bank
    ThirdParty,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Own => "OWN",
            MovementKind::ThirdParty => "THIRD_PARTY",
        }
    }
}

/// Internal transfer errors
#[derive(Debug, Clone, Error)]
pub enum InternalTransferError {
    #[error("Invalid account identifier: {0}")]
    InvalidAccount(#[from] ValidationError),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Origin and destination cannot be the same account")]
    SameAccount,

    #[error("Description exceeds {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,

    #[error("Both accounts must be held at this bank")]
    NotLocalAccount,

    #[error("Origin account not found")]
    OriginNotFound,

    #[error("Origin account does not belong to the caller")]
    NotAccountOwner,

    #[error("Origin account does not permit debit")]
    DebitNotPermitted,

    #[error("Destination account not found")]
    DestinationNotFound,

    #[error("Destination account cannot receive funds")]
    CreditNotPermitted,

    #[error("Currency does not match the accounts")]
    CurrencyMismatch,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InternalTransferError {
    pub fn code(&self) -> &'static str {
        match self {
            InternalTransferError::InvalidAccount(_) => "INVALID_ACCOUNT",
            InternalTransferError::InvalidAmount => "INVALID_AMOUNT",
            InternalTransferError::SameAccount => "SAME_ACCOUNT",
            InternalTransferError::DescriptionTooLong => "DESCRIPTION_TOO_LONG",
            InternalTransferError::NotLocalAccount => "NOT_LOCAL_ACCOUNT",
            InternalTransferError::OriginNotFound => "ORIGIN_NOT_FOUND",
            InternalTransferError::NotAccountOwner => "FORBIDDEN",
            InternalTransferError::DebitNotPermitted => "ACCOUNT_NO_DEBIT",
            InternalTransferError::DestinationNotFound => "DESTINATION_NOT_FOUND",
            InternalTransferError::CreditNotPermitted => "ACCOUNT_NO_CREDIT",
            InternalTransferError::CurrencyMismatch => "CURRENCY_NOT_SUPPORTED",
            InternalTransferError::InsufficientFunds => "NO_FUNDS",
            InternalTransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            InternalTransferError::InvalidAccount(_)
            | InternalTransferError::InvalidAmount
            | InternalTransferError::SameAccount
            | InternalTransferError::DescriptionTooLong
            | InternalTransferError::NotLocalAccount => 400,
            InternalTransferError::NotAccountOwner => 403,
            InternalTransferError::OriginNotFound
            | InternalTransferError::DebitNotPermitted
            | InternalTransferError::DestinationNotFound
            | InternalTransferError::CreditNotPermitted
            | InternalTransferError::CurrencyMismatch
            | InternalTransferError::InsufficientFunds => 422,
            InternalTransferError::Internal(_) => 500,
        }
    }
}

/// Validated executor input
#[derive(Debug, Clone)]
pub struct InternalTransferRequest {
    pub origin: String,
    pub destination: String,
    pub kind: MovementKind,
    pub currency: Currency,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Executes same-bank transfers as one atomic ledger call
pub struct InternalTransferExecutor {
    ledger: Arc<dyn LedgerAdapter>,
    bank_code: String,
}

impl InternalTransferExecutor {
    pub fn new(ledger: Arc<dyn LedgerAdapter>, bank_code: String) -> Self {
        Self { ledger, bank_code }
    }

    pub async fn execute(
        &self,
        caller_id: i64,
        req: InternalTransferRequest,
    ) -> Result<(), InternalTransferError> {
        let origin = AccountNumber::parse(&req.origin)?;
        let destination = AccountNumber::parse(&req.destination)?;

        if req.amount <= Decimal::ZERO {
            return Err(InternalTransferError::InvalidAmount);
        }
        if origin == destination {
            return Err(InternalTransferError::SameAccount);
        }
        if req
            .description
            .as_deref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION_LEN)
        {
            return Err(InternalTransferError::DescriptionTooLong);
        }
        if origin.bank_code() != self.bank_code || destination.bank_code() != self.bank_code {
            return Err(InternalTransferError::NotLocalAccount);
        }

        let account = self
            .ledger
            .fetch_account(&origin)
            .await
            .map_err(|e| InternalTransferError::Internal(e.to_string()))?
            .ok_or(InternalTransferError::OriginNotFound)?;
        if account.owner_id != caller_id {
            return Err(InternalTransferError::NotAccountOwner);
        }
        if !account.can_debit() {
            return Err(InternalTransferError::DebitNotPermitted);
        }

        self.ledger
            .transfer(
                &origin,
                &destination,
                req.kind,
                req.currency,
                req.amount,
                req.description.as_deref(),
            )
            .await
            .map_err(|e| match e {
                // The origin existed a moment ago; not-found now means the
                // destination leg.
                LedgerError::AccountNotFound => InternalTransferError::DestinationNotFound,
                LedgerError::InsufficientFunds => InternalTransferError::InsufficientFunds,
                LedgerError::DebitNotPermitted => InternalTransferError::DebitNotPermitted,
                LedgerError::CreditNotPermitted => InternalTransferError::CreditNotPermitted,
                LedgerError::CurrencyMismatch => InternalTransferError::CurrencyMismatch,
                LedgerError::HoldNotFound | LedgerError::Storage(_) => {
                    InternalTransferError::Internal(e.to_string())
                }
            })?;

        info!(
            origin = %origin,
            destination = %destination,
            amount = %req.amount,
            kind = req.kind.as_str(),
            "Internal transfer applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountStatus};
    use crate::ledger::MemoryLedger;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const ORIGIN: &str = "CR2100000107000000000001";
    const DEST: &str = "CR2100000107000000000002";
    const FOREIGN: &str = "CR8400000208000000000777";

    fn executor() -> (InternalTransferExecutor, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        for (number, owner) in [(ORIGIN, 1001), (DEST, 2002)] {
            ledger.insert(Account {
                number: AccountNumber::parse(number).unwrap(),
                owner_id: owner,
                currency: Currency::CRC,
                balance: dec("1000.00"),
                held: Decimal::ZERO,
                permits_debit: true,
                permits_credit: true,
                status: AccountStatus::Active,
            });
        }
        (
            InternalTransferExecutor::new(ledger.clone(), "00000107".into()),
            ledger,
        )
    }

    fn request(amount: &str) -> InternalTransferRequest {
        InternalTransferRequest {
            origin: ORIGIN.into(),
            destination: DEST.into(),
            kind: MovementKind::ThirdParty,
            currency: Currency::CRC,
            amount: dec(amount),
            description: Some("lunch".into()),
        }
    }

    #[tokio::test]
    async fn test_transfer_round_trip() {
        let (executor, ledger) = executor();
        executor.execute(1001, request("250.00")).await.unwrap();

        let origin = ledger.snapshot(&AccountNumber::parse(ORIGIN).unwrap()).unwrap();
        let dest = ledger.snapshot(&AccountNumber::parse(DEST).unwrap()).unwrap();
        assert_eq!(origin.balance, dec("750.00"));
        assert_eq!(dest.balance, dec("1250.00"));
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let (executor, ledger) = executor();
        let err = executor.execute(1001, request("1000.01")).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::InsufficientFunds));
        assert_eq!(err.http_status(), 422);

        // Neither leg moved.
        let origin = ledger.snapshot(&AccountNumber::parse(ORIGIN).unwrap()).unwrap();
        let dest = ledger.snapshot(&AccountNumber::parse(DEST).unwrap()).unwrap();
        assert_eq!(origin.balance, dec("1000.00"));
        assert_eq!(dest.balance, dec("1000.00"));
    }

    #[tokio::test]
    async fn test_caller_must_own_origin() {
        let (executor, _) = executor();
        let err = executor.execute(2002, request("10.00")).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::NotAccountOwner));
    }

    #[tokio::test]
    async fn test_rejects_zero_amount_and_same_account() {
        let (executor, _) = executor();

        let err = executor.execute(1001, request("0")).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::InvalidAmount));

        let mut req = request("10.00");
        req.destination = ORIGIN.into();
        let err = executor.execute(1001, req).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::SameAccount));
    }

    #[tokio::test]
    async fn test_rejects_foreign_destination() {
        let (executor, _) = executor();
        let mut req = request("10.00");
        req.destination = FOREIGN.into();
        let err = executor.execute(1001, req).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::NotLocalAccount));
    }

    #[tokio::test]
    async fn test_unknown_destination() {
        let (executor, _) = executor();
        let mut req = request("10.00");
        req.destination = "CR2100000107000000000099".into();
        let err = executor.execute(1001, req).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::DestinationNotFound));
    }

    #[tokio::test]
    async fn test_description_length_cap() {
        let (executor, _) = executor();
        let mut req = request("10.00");
        req.description = Some("x".repeat(256));
        let err = executor.execute(1001, req).await.unwrap_err();
        assert!(matches!(err, InternalTransferError::DescriptionTooLong));
    }

    #[test]
    fn test_movement_kind_serde() {
        assert_eq!(
            serde_json::to_string(&MovementKind::ThirdParty).unwrap(),
            "\"third_party\""
        );
        let kind: MovementKind = serde_json::from_str("\"own\"").unwrap();
        assert_eq!(kind, MovementKind::Own);
    }
}
