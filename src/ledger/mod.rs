//! Ledger Adapter
//!
//! Wraps the atomic, single-statement account operations exposed by the
//! ledger store. The rest of the backend never reads a balance and writes it
//! back: every mutation is exactly one adapter call, so no partial state is
//! observable and no lost-update interleaving is possible.
//!
//! Two implementations share the contract: [`PgLedger`] calls the store's
//! stored procedures, [`MemoryLedger`] mirrors them in process memory for
//! tests and offline runs.

pub mod memory;
pub mod pg;

pub use memory::MemoryLedger;
pub use pg::PgLedger;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::account::{Account, AccountNumber, Currency};
use crate::internal_transfer::MovementKind;

/// Ledger operation errors
///
/// Mirrors the status codes returned by the store's procedures; `Storage`
/// covers connection and protocol failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Account does not permit debit")]
    DebitNotPermitted,

    #[error("Account does not permit credit")]
    CreditNotPermitted,

    #[error("Currency mismatch")]
    CurrencyMismatch,

    #[error("No matching hold on account")]
    HoldNotFound,

    #[error("Ledger store error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}

/// Atomic account operations
///
/// Each method maps to one single-statement operation in the store; the
/// store guarantees atomicity, the adapter only translates inputs and status
/// codes.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// Read-only account snapshot
    async fn fetch_account(&self, number: &AccountNumber)
    -> Result<Option<Account>, LedgerError>;

    /// Debit `origin` and credit `destination` as one indivisible unit
    async fn transfer(
        &self,
        origin: &AccountNumber,
        destination: &AccountNumber,
        kind: MovementKind,
        currency: Currency,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Credit `number` by `amount`
    async fn credit(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError>;

    /// Place a funds hold: fails unless `balance - held >= amount`
    async fn hold(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError>;

    /// Finalize a held debit: decrements balance and held together
    async fn capture(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError>;

    /// Drop a hold without debiting
    async fn release(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError>;
}
