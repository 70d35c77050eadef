//! Correlation table
//!
//! Maps an outstanding transaction id to the single caller suspended on its
//! outcome. The table is mutated from two sides (the coordinator registers
//! and expires entries, the channel dispatcher resolves them), so every
//! operation is a single atomic map call; there is never a lookup followed by
//! a separate delete for the same id.

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use super::protocol::RejectReason;

/// Terminal outcome delivered to a waiting caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Committed,
    Rejected(RejectReason),
}

/// Pending-caller registry, keyed by transaction id
#[derive(Default)]
pub struct CorrelationTable {
    waiters: DashMap<String, oneshot::Sender<TransferOutcome>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `id`; the returned receiver resolves exactly
    /// once, or never if the entry is expired first.
    ///
    /// Must be called before the intent is transmitted, so a reply can never
    /// arrive and find no waiter.
    pub fn register(&self, id: &str) -> oneshot::Receiver<TransferOutcome> {
        let (tx, rx) = oneshot::channel();
        if self.waiters.insert(id.to_string(), tx).is_some() {
            // A collision here means two live transfers share an id; the old
            // waiter's sender is dropped and it observes a closed channel.
            tracing::error!(id, "Correlation entry overwritten: duplicate transaction id");
        }
        rx
    }

    /// Resolve and remove the entry for `id`
    ///
    /// Returns `false` when no entry exists: a late or duplicate terminal
    /// event, which is a safe no-op by design.
    pub fn resolve(&self, id: &str, outcome: TransferOutcome) -> bool {
        match self.waiters.remove(id) {
            Some((_, tx)) => {
                // A send error means the waiter already gave up (timeout path
                // raced the resolve); the entry is gone either way.
                let _ = tx.send(outcome);
                true
            }
            None => {
                debug!(id, ?outcome, "Terminal event for unknown id ignored");
                false
            }
        }
    }

    /// Remove the entry for `id` without signalling
    ///
    /// Only the waiter itself calls this, after abandoning its receiver, so
    /// no caller can be left waiting forever.
    pub fn expire(&self, id: &str) -> bool {
        self.waiters.remove(id).is_some()
    }

    /// Number of in-flight transfers
    pub fn pending(&self) -> usize {
        self.waiters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_resolve() {
        let table = CorrelationTable::new();
        let rx = table.register("TX-1");

        assert!(table.resolve("TX-1", TransferOutcome::Committed));
        assert_eq!(rx.await.unwrap(), TransferOutcome::Committed);
        assert_eq!(table.pending(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_terminal_event_is_noop() {
        let table = CorrelationTable::new();
        let rx = table.register("TX-1");

        assert!(table.resolve("TX-1", TransferOutcome::Committed));
        assert!(!table.resolve("TX-1", TransferOutcome::Committed));
        assert_eq!(rx.await.unwrap(), TransferOutcome::Committed);
    }

    #[tokio::test]
    async fn test_resolve_after_expire_is_noop() {
        let table = CorrelationTable::new();
        let rx = table.register("TX-3");
        drop(rx); // waiter gave up

        assert!(table.expire("TX-3"));
        assert!(!table.resolve("TX-3", TransferOutcome::Committed));
        assert!(!table.expire("TX-3"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_id() {
        let table = CorrelationTable::new();
        assert!(!table.resolve(
            "never-registered",
            TransferOutcome::Rejected(RejectReason::NoFunds)
        ));
    }

    #[tokio::test]
    async fn test_rejected_outcome_carries_reason() {
        let table = CorrelationTable::new();
        let rx = table.register("TX-9");
        table.resolve("TX-9", TransferOutcome::Rejected(RejectReason::NoFunds));
        assert_eq!(
            rx.await.unwrap(),
            TransferOutcome::Rejected(RejectReason::NoFunds)
        );
    }
}
