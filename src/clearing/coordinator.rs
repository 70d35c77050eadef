//! Interbank transfer coordinator (initiator side)
//!
//! Drives an outbound transfer for a local customer: validate, authorize,
//! register the waiter, send the intent, then suspend until the
//! clearinghouse delivers a terminal event or the timeout fires.
//!
//! Ordering invariant: the correlation entry is registered *before* the
//! intent is transmitted, so even an instant reply finds its waiter. After
//! transmission, the correlation mechanism is the only path that resolves
//! the caller; no other code path may touch the pending entry.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::channel::ChannelClient;
use super::correlation::{CorrelationTable, TransferOutcome};
use super::error::InterbankError;
use super::journal::{JournalState, TransferJournal};
use super::protocol::{ClearingMessage, TransactionId};
use crate::account::{AccountNumber, Currency};
use crate::ledger::LedgerAdapter;

/// Caller-supplied transfer intent, unvalidated
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub description: Option<String>,
}

/// Initiator-side coordinator for outbound interbank transfers
pub struct InterbankCoordinator {
    channel: ChannelClient,
    correlation: Arc<CorrelationTable>,
    ledger: Arc<dyn LedgerAdapter>,
    journal: Arc<dyn TransferJournal>,
    bank_code: String,
    intent_timeout: Duration,
}

impl InterbankCoordinator {
    pub fn new(
        channel: ChannelClient,
        correlation: Arc<CorrelationTable>,
        ledger: Arc<dyn LedgerAdapter>,
        journal: Arc<dyn TransferJournal>,
        bank_code: String,
        intent_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            correlation,
            ledger,
            journal,
            bank_code,
            intent_timeout,
        }
    }

    /// Submit a transfer and suspend until it reaches a terminal state
    ///
    /// Validation and authorization failures resolve locally and never
    /// consume a correlation slot. A timeout is an ambiguous outcome: the
    /// clearinghouse may still complete the transfer, and this node cannot
    /// know, so the error says so rather than claiming rejection.
    pub async fn submit(
        &self,
        caller_id: i64,
        intent: TransferIntent,
    ) -> Result<TransactionId, InterbankError> {
        let from = AccountNumber::parse(&intent.from)?;
        let to = AccountNumber::parse(&intent.to)?;
        if intent.amount <= Decimal::ZERO {
            return Err(InterbankError::InvalidAmount);
        }
        if from.bank_code() != self.bank_code {
            return Err(InterbankError::SourceNotLocal);
        }
        if to.bank_code() == self.bank_code {
            return Err(InterbankError::DestinationNotForeign);
        }

        let account = self
            .ledger
            .fetch_account(&from)
            .await
            .map_err(|e| InterbankError::Internal(e.to_string()))?
            .ok_or(InterbankError::SourceAccountNotFound)?;
        if account.owner_id != caller_id {
            return Err(InterbankError::NotAccountOwner);
        }
        if !account.can_debit() {
            return Err(InterbankError::DebitNotPermitted);
        }
        if account.currency != intent.currency {
            return Err(InterbankError::CurrencyMismatch);
        }

        if !self.channel.is_connected() {
            return Err(InterbankError::ChannelDown);
        }

        let id = TransactionId::generate();
        self.journal
            .record(id.as_str(), JournalState::Created, intent.description.as_deref())
            .await?;

        // Register before transmitting: an immediate reply must find its waiter.
        let receiver = self.correlation.register(id.as_str());
        self.journal
            .record(id.as_str(), JournalState::IntentSent, None)
            .await
            .inspect_err(|_| {
                self.correlation.expire(id.as_str());
            })?;

        if let Err(e) = self.channel.send(ClearingMessage::Intent {
            id: id.as_str().to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            amount: intent.amount,
            currency: intent.currency,
        }) {
            self.correlation.expire(id.as_str());
            return Err(e);
        }

        info!(id = %id, from = %from, to = %to, amount = %intent.amount, "Intent sent");

        match tokio::time::timeout(self.intent_timeout, receiver).await {
            Ok(Ok(TransferOutcome::Committed)) => {
                self.record_terminal(&id, JournalState::Committed, None).await;
                info!(id = %id, "Transfer committed");
                Ok(id)
            }
            Ok(Ok(TransferOutcome::Rejected(reason))) => {
                self.record_terminal(&id, JournalState::Rejected, Some(reason.code()))
                    .await;
                info!(id = %id, reason = %reason, "Transfer rejected");
                Err(InterbankError::Rejected(reason))
            }
            Ok(Err(_)) => {
                // Sender dropped without resolving; only an id collision can
                // do that, and ids are generated fresh per attempt.
                warn!(id = %id, "Correlation entry lost while waiting");
                Err(InterbankError::Internal("correlation entry lost".into()))
            }
            Err(_) => {
                // Whether the clearinghouse ever moved funds is unknown here;
                // the journal row is what an operator reconciles against.
                self.correlation.expire(id.as_str());
                self.record_terminal(&id, JournalState::TimedOut, None).await;
                warn!(id = %id, timeout_ms = self.intent_timeout.as_millis() as u64,
                      "No terminal event before timeout; outcome unknown");
                Err(InterbankError::Timeout)
            }
        }
    }

    /// Record a terminal transition; the outcome is already decided, so a
    /// journal failure is logged, not surfaced to the caller.
    async fn record_terminal(&self, id: &TransactionId, state: JournalState, detail: Option<&str>) {
        if let Err(e) = self.journal.record(id.as_str(), state, detail).await {
            tracing::error!(id = %id, state = state.as_str(), error = %e, "Journal write failed");
        }
    }
}
