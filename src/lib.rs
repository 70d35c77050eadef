//! bancore - retail-banking backend
//!
//! Accounts, money movement, and the interbank transfer coordinator behind
//! the bank's single-page application.
//!
//! # Modules
//!
//! - [`account`] - shared data model and account-number validation
//! - [`ledger`] - atomic ledger operations (PostgreSQL store or in-memory)
//! - [`internal_transfer`] - same-bank transfers, one atomic call
//! - [`clearing`] - interbank transfers through the clearinghouse over a
//!   duplex channel: coordinator, participant, correlation, journal
//! - [`auth`] - bearer-token verification boundary
//! - [`gateway`] - axum HTTP surface
//! - [`config`] / [`logging`] - runtime configuration and tracing setup

pub mod account;
pub mod auth;
pub mod clearing;
pub mod config;
pub mod gateway;
pub mod internal_transfer;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Account, AccountNumber, AccountStatus, Currency};
pub use clearing::{
    ChannelClient, ClearingMessage, CorrelationTable, InterbankCoordinator, InterbankError,
    Participant, RejectReason, TransactionId, TransferIntent, TransferOutcome,
};
pub use internal_transfer::{InternalTransferExecutor, InternalTransferRequest, MovementKind};
pub use ledger::{LedgerAdapter, LedgerError, MemoryLedger, PgLedger};
