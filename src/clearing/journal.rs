//! Interbank transfer journal
//!
//! Append-only record of transaction state transitions, written *before* the
//! corresponding message is sent or answered. In-flight transfers therefore
//! survive a crash as journal rows an operator can reconcile against the
//! clearinghouse; without this, a restart would erase all knowledge of
//! unfinished transfers.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;

use super::error::InterbankError;

/// Journalled transaction states, both roles
///
/// Initiator: `Created -> IntentSent -> Committed | Rejected | TimedOut`.
/// Participant leg: `Reserved -> Debited | RolledBack`, or `Credited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalState {
    Created,
    IntentSent,
    Committed,
    Rejected,
    TimedOut,
    Reserved,
    Credited,
    Debited,
    RolledBack,
}

impl JournalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalState::Created => "CREATED",
            JournalState::IntentSent => "INTENT_SENT",
            JournalState::Committed => "COMMITTED",
            JournalState::Rejected => "REJECTED",
            JournalState::TimedOut => "TIMED_OUT",
            JournalState::Reserved => "RESERVED",
            JournalState::Credited => "CREDITED",
            JournalState::Debited => "DEBITED",
            JournalState::RolledBack => "ROLLED_BACK",
        }
    }
}

/// Write-ahead journal for interbank transactions
#[async_trait]
pub trait TransferJournal: Send + Sync {
    /// Append one transition; must complete before the triggering message
    /// leaves the process.
    async fn record(
        &self,
        tx_id: &str,
        state: JournalState,
        detail: Option<&str>,
    ) -> Result<(), InterbankError>;
}

/// Journal backed by the `clearing_journal` table
pub struct PgJournal {
    pool: PgPool,
}

impl PgJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferJournal for PgJournal {
    async fn record(
        &self,
        tx_id: &str,
        state: JournalState,
        detail: Option<&str>,
    ) -> Result<(), InterbankError> {
        sqlx::query(
            r#"INSERT INTO clearing_journal (tx_id, state, detail, recorded_at)
               VALUES ($1, $2, $3, NOW())"#,
        )
        .bind(tx_id)
        .bind(state.as_str())
        .bind(detail)
        .execute(&self.pool)
        .await
        .map_err(|e| InterbankError::Internal(format!("journal write failed: {e}")))?;
        Ok(())
    }
}

/// In-memory journal for tests and offline runs
#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<(String, JournalState, Option<String>)>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// States recorded for one transaction, in order
    pub fn states_for(&self, tx_id: &str) -> Vec<JournalState> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| id == tx_id)
            .map(|(_, state, _)| *state)
            .collect()
    }
}

#[async_trait]
impl TransferJournal for MemoryJournal {
    async fn record(
        &self,
        tx_id: &str,
        state: JournalState,
        detail: Option<&str>,
    ) -> Result<(), InterbankError> {
        self.entries.lock().unwrap().push((
            tx_id.to_string(),
            state,
            detail.map(|d| d.to_string()),
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_journal_orders_transitions() {
        let journal = MemoryJournal::new();
        journal.record("TX-1", JournalState::Created, None).await.unwrap();
        journal
            .record("TX-1", JournalState::IntentSent, None)
            .await
            .unwrap();
        journal
            .record("TX-1", JournalState::Committed, None)
            .await
            .unwrap();
        journal.record("TX-2", JournalState::Reserved, None).await.unwrap();

        assert_eq!(
            journal.states_for("TX-1"),
            vec![
                JournalState::Created,
                JournalState::IntentSent,
                JournalState::Committed
            ]
        );
        assert_eq!(journal.states_for("TX-2"), vec![JournalState::Reserved]);
    }
}
