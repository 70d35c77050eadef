//! Interbank clearing subsystem
//!
//! Moves money between an account at this bank and an account at another
//! bank through the clearinghouse, over one persistent duplex channel
//! instead of call/response.
//!
//! # Roles
//!
//! The same process plays two independent roles:
//!
//! - **Initiator** ([`InterbankCoordinator`]): a local customer asks for an
//!   outbound transfer. The coordinator sends `transfer.intent` and suspends
//!   the caller on a [`CorrelationTable`] entry until `transfer.commit`,
//!   `transfer.reject`, or a timeout.
//! - **Participant** ([`Participant`]): the clearinghouse drives this bank's
//!   leg of somebody else's transfer with `transfer.reserve` /
//!   `transfer.credit` / `transfer.debit` / `transfer.rollback`; every event
//!   is answered with a matching `.result` carrying the same id.
//!
//! # Protocol, initiator's view
//!
//! ```text
//! CREATED -> INTENT_SENT -> COMMITTED | REJECTED | TIMED_OUT
//! ```
//!
//! # Protocol, one local leg
//!
//! ```text
//! reserve -> RESERVED -> debit -> DEBITED
//!                     -> rollback -> ROLLED_BACK
//! credit  -> CREDITED                      (destination leg)
//! ```
//!
//! A reservation is a real funds hold; a debit fires at most once and only
//! against a live hold; a rollback releases the hold and never reverses a
//! finalized debit.

pub mod channel;
pub mod coordinator;
pub mod correlation;
pub mod error;
pub mod journal;
pub mod participant;
pub mod protocol;


pub use channel::{ChannelClient, ChannelRunner, Dispatcher, build_channel};
pub use coordinator::{InterbankCoordinator, TransferIntent};
pub use correlation::{CorrelationTable, TransferOutcome};
pub use error::InterbankError;
pub use journal::{JournalState, MemoryJournal, PgJournal, TransferJournal};
pub use participant::Participant;
pub use protocol::{ClearingMessage, RejectReason, TransactionId};
