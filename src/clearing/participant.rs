//! Participant-side event handling
//!
//! This bank is reachable as the other leg of transfers initiated elsewhere:
//! the clearinghouse asks it to reserve, credit, debit, or roll back against
//! locally-held accounts. Every event gets exactly one result message: an
//! unanswered event would stall the remote coordinator forever, so internal
//! failures are answered with an explicit reason, never silence.
//!
//! A reservation places a real funds hold (`ledger.hold`), not an advisory
//! balance check: two concurrent reservations cannot both pass against the
//! same available balance. The per-id leg table enforces protocol order:
//! a debit fires at most once, only after a reservation, and never after a
//! rollback.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::journal::{JournalState, TransferJournal};
use super::protocol::{ClearingMessage, RejectReason};
use crate::account::{Account, AccountNumber};
use crate::ledger::{LedgerAdapter, LedgerError};

/// State of one local leg, keyed by transaction id
///
/// `Reserved` remembers the held amount so a later debit or rollback must
/// match it exactly. Terminal states are kept so replayed events are
/// rejected instead of applied twice.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LegState {
    Reserved(Decimal),
    Debited,
    RolledBack,
    Credited,
}

/// Handles inbound clearing events for accounts held at this bank
pub struct Participant {
    ledger: Arc<dyn LedgerAdapter>,
    journal: Arc<dyn TransferJournal>,
    legs: DashMap<String, LegState>,
}

impl Participant {
    pub fn new(ledger: Arc<dyn LedgerAdapter>, journal: Arc<dyn TransferJournal>) -> Self {
        Self {
            ledger,
            journal,
            legs: DashMap::new(),
        }
    }

    /// Answer one inbound event; returns `None` for non-participant messages
    pub async fn handle(&self, msg: ClearingMessage) -> Option<ClearingMessage> {
        match msg {
            ClearingMessage::Reserve { id, from, amount } => {
                Some(self.reserve(id, from, amount).await)
            }
            ClearingMessage::Credit {
                id,
                to,
                amount,
                currency,
            } => Some(self.credit(id, to, amount, currency).await),
            ClearingMessage::Debit { id, from, amount } => {
                Some(self.debit(id, from, amount).await)
            }
            ClearingMessage::Rollback { id, to, amount } => {
                Some(self.rollback(id, to, amount).await)
            }
            _ => None,
        }
    }

    async fn reserve(&self, id: String, from: String, amount: Decimal) -> ClearingMessage {
        let fail = |reason: RejectReason| ClearingMessage::ReserveResult {
            id: id.clone(),
            ok: false,
            reason: Some(reason.code().to_string()),
        };

        if self.legs.contains_key(&id) {
            warn!(%id, "Duplicate reserve for known transaction rejected");
            return fail(RejectReason::ReserveFailed);
        }

        let Ok(account) = AccountNumber::parse(&from) else {
            return fail(RejectReason::InvalidPayload);
        };
        if amount <= Decimal::ZERO {
            return fail(RejectReason::InvalidPayload);
        }

        match self.fetch(&account, RejectReason::ReserveFailed).await {
            Ok(Some(snapshot)) if !snapshot.can_debit() => {
                return fail(RejectReason::AccountNoDebit);
            }
            Ok(Some(_)) => {}
            Ok(None) => return fail(RejectReason::AccountNotFound),
            Err(reason) => return fail(reason),
        }

        if self
            .journal
            .record(&id, JournalState::Reserved, Some(account.as_str()))
            .await
            .is_err()
        {
            return fail(RejectReason::ReserveFailed);
        }

        match self.ledger.hold(&account, amount).await {
            Ok(()) => {
                self.legs.insert(id.clone(), LegState::Reserved(amount));
                info!(%id, account = %account, %amount, "Funds reserved");
                ClearingMessage::ReserveResult {
                    id,
                    ok: true,
                    reason: None,
                }
            }
            Err(LedgerError::InsufficientFunds) => fail(RejectReason::NoFunds),
            Err(LedgerError::DebitNotPermitted) => fail(RejectReason::AccountNoDebit),
            Err(LedgerError::AccountNotFound) => fail(RejectReason::AccountNotFound),
            Err(e) => {
                warn!(%id, error = %e, "Reserve failed in ledger");
                fail(RejectReason::ReserveFailed)
            }
        }
    }

    async fn credit(
        &self,
        id: String,
        to: String,
        amount: Decimal,
        currency: crate::account::Currency,
    ) -> ClearingMessage {
        let fail = |reason: RejectReason| ClearingMessage::CreditResult {
            id: id.clone(),
            ok: false,
            reason: Some(reason.code().to_string()),
        };

        if self.legs.contains_key(&id) {
            warn!(%id, "Duplicate credit for known transaction rejected");
            return fail(RejectReason::CreditFailed);
        }

        let Ok(account) = AccountNumber::parse(&to) else {
            return fail(RejectReason::InvalidPayload);
        };
        if amount <= Decimal::ZERO {
            return fail(RejectReason::InvalidPayload);
        }

        match self.fetch(&account, RejectReason::CreditFailed).await {
            Ok(Some(snapshot)) if !snapshot.can_credit() => {
                return fail(RejectReason::AccountNoCredit);
            }
            Ok(Some(snapshot)) if snapshot.currency != currency => {
                return fail(RejectReason::CurrencyNotSupported);
            }
            Ok(Some(_)) => {}
            Ok(None) => return fail(RejectReason::AccountNotFound),
            Err(reason) => return fail(reason),
        }

        if self
            .journal
            .record(&id, JournalState::Credited, Some(account.as_str()))
            .await
            .is_err()
        {
            return fail(RejectReason::CreditFailed);
        }

        match self.ledger.credit(&account, amount).await {
            Ok(()) => {
                self.legs.insert(id.clone(), LegState::Credited);
                info!(%id, account = %account, %amount, "Destination credited");
                ClearingMessage::CreditResult {
                    id,
                    ok: true,
                    reason: None,
                }
            }
            Err(LedgerError::CreditNotPermitted) => fail(RejectReason::AccountNoCredit),
            Err(LedgerError::AccountNotFound) => fail(RejectReason::AccountNotFound),
            Err(e) => {
                warn!(%id, error = %e, "Credit failed in ledger");
                fail(RejectReason::CreditFailed)
            }
        }
    }

    async fn debit(&self, id: String, from: String, amount: Decimal) -> ClearingMessage {
        let fail = |reason: RejectReason| ClearingMessage::DebitResult {
            id: id.clone(),
            ok: false,
            reason: Some(reason.code().to_string()),
        };

        // A debit is only valid on a live reservation with the same amount;
        // anything else (no reserve, double debit, debit after rollback,
        // amount drift) is rejected rather than applied.
        match self.legs.get(&id).map(|leg| *leg) {
            Some(LegState::Reserved(held)) if held == amount => {}
            other => {
                warn!(%id, state = ?other, "Out-of-order debit rejected");
                return fail(RejectReason::DebitFailed);
            }
        }

        let Ok(account) = AccountNumber::parse(&from) else {
            return fail(RejectReason::InvalidPayload);
        };

        if self
            .journal
            .record(&id, JournalState::Debited, Some(account.as_str()))
            .await
            .is_err()
        {
            return fail(RejectReason::DebitFailed);
        }

        match self.ledger.capture(&account, amount).await {
            Ok(()) => {
                self.legs.insert(id.clone(), LegState::Debited);
                info!(%id, account = %account, %amount, "Held debit finalized");
                ClearingMessage::DebitResult {
                    id,
                    ok: true,
                    reason: None,
                }
            }
            Err(LedgerError::AccountNotFound) => fail(RejectReason::AccountNotFound),
            Err(e) => {
                warn!(%id, error = %e, "Debit failed in ledger");
                fail(RejectReason::DebitFailed)
            }
        }
    }

    async fn rollback(&self, id: String, to: String, amount: Decimal) -> ClearingMessage {
        let fail = |reason: RejectReason| ClearingMessage::RollbackResult {
            id: id.clone(),
            ok: false,
            reason: Some(reason.code().to_string()),
        };

        // Rollback only ever reverses a live reservation. An already-debited
        // leg stays debited: compensation for that would be a credit decided
        // by the clearinghouse, never a second balance mutation here.
        match self.legs.get(&id).map(|leg| *leg) {
            Some(LegState::Reserved(held)) if held == amount => {}
            other => {
                warn!(%id, state = ?other, "Out-of-order rollback rejected");
                return fail(RejectReason::RollbackFailed);
            }
        }

        let Ok(account) = AccountNumber::parse(&to) else {
            return fail(RejectReason::InvalidPayload);
        };

        if self
            .journal
            .record(&id, JournalState::RolledBack, Some(account.as_str()))
            .await
            .is_err()
        {
            return fail(RejectReason::RollbackFailed);
        }

        match self.ledger.release(&account, amount).await {
            Ok(()) => {
                self.legs.insert(id.clone(), LegState::RolledBack);
                info!(%id, account = %account, %amount, "Reservation released");
                ClearingMessage::RollbackResult {
                    id,
                    ok: true,
                    reason: None,
                }
            }
            Err(LedgerError::AccountNotFound) => fail(RejectReason::AccountNotFound),
            Err(e) => {
                warn!(%id, error = %e, "Rollback failed in ledger");
                fail(RejectReason::RollbackFailed)
            }
        }
    }

    async fn fetch(
        &self,
        account: &AccountNumber,
        on_error: RejectReason,
    ) -> Result<Option<Account>, RejectReason> {
        self.ledger.fetch_account(account).await.map_err(|e| {
            warn!(account = %account, error = %e, "Ledger lookup failed");
            on_error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountStatus, Currency};
    use crate::clearing::journal::MemoryJournal;
    use crate::ledger::MemoryLedger;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    const ACCT: &str = "CR2100000107000000000001";

    struct Harness {
        participant: Participant,
        ledger: Arc<MemoryLedger>,
        journal: Arc<MemoryJournal>,
    }

    fn harness(mutate: impl FnOnce(&mut Account)) -> Harness {
        let ledger = Arc::new(MemoryLedger::new());
        let mut account = Account {
            number: AccountNumber::parse(ACCT).unwrap(),
            owner_id: 1001,
            currency: Currency::CRC,
            balance: dec("1000.00"),
            held: Decimal::ZERO,
            permits_debit: true,
            permits_credit: true,
            status: AccountStatus::Active,
        };
        mutate(&mut account);
        ledger.insert(account);

        let journal = Arc::new(MemoryJournal::new());
        Harness {
            participant: Participant::new(ledger.clone(), journal.clone()),
            ledger,
            journal,
        }
    }

    fn reserve(id: &str, amount: &str) -> ClearingMessage {
        ClearingMessage::Reserve {
            id: id.into(),
            from: ACCT.into(),
            amount: dec(amount),
        }
    }

    fn assert_failed(msg: &ClearingMessage, want_reason: &str) {
        match msg {
            ClearingMessage::ReserveResult { ok, reason, .. }
            | ClearingMessage::CreditResult { ok, reason, .. }
            | ClearingMessage::DebitResult { ok, reason, .. }
            | ClearingMessage::RollbackResult { ok, reason, .. } => {
                assert!(!ok);
                assert_eq!(reason.as_deref(), Some(want_reason));
            }
            other => panic!("not a result message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reserve_ok_places_hold() {
        let h = harness(|_| {});
        let reply = h.participant.handle(reserve("TX-2", "50")).await.unwrap();

        assert_eq!(
            reply,
            ClearingMessage::ReserveResult {
                id: "TX-2".into(),
                ok: true,
                reason: None
            }
        );
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.held, dec("50"));
        assert_eq!(snap.balance, dec("1000.00"));
        assert_eq!(h.journal.states_for("TX-2"), vec![JournalState::Reserved]);
    }

    #[tokio::test]
    async fn test_reserve_no_debit_flag() {
        let h = harness(|a| a.permits_debit = false);
        let reply = h.participant.handle(reserve("TX-1", "50")).await.unwrap();

        assert_failed(&reply, "ACCOUNT_NO_DEBIT");
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.held, Decimal::ZERO);
        assert_eq!(snap.balance, dec("1000.00"));
    }

    #[tokio::test]
    async fn test_reserve_insufficient_funds() {
        let h = harness(|_| {});
        let reply = h.participant.handle(reserve("TX-1", "5000")).await.unwrap();
        assert_failed(&reply, "NO_FUNDS");
    }

    #[tokio::test]
    async fn test_reserve_unknown_account() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Reserve {
                id: "TX-1".into(),
                from: "CR2100000107000000000099".into(),
                amount: dec("50"),
            })
            .await
            .unwrap();
        assert_failed(&reply, "ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reserve_malformed_account() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Reserve {
                id: "TX-1".into(),
                from: "garbage".into(),
                amount: dec("50"),
            })
            .await
            .unwrap();
        assert_failed(&reply, "INVALID_PAYLOAD");
    }

    #[tokio::test]
    async fn test_duplicate_reserve_rejected() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-1", "50")).await.unwrap();
        let reply = h.participant.handle(reserve("TX-1", "50")).await.unwrap();

        assert_failed(&reply, "RESERVE_FAILED");
        // Only the first hold stands.
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.held, dec("50"));
    }

    #[tokio::test]
    async fn test_credit_ok() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Credit {
                id: "TX-5".into(),
                to: ACCT.into(),
                amount: dec("200"),
                currency: Currency::CRC,
            })
            .await
            .unwrap();

        assert_eq!(
            reply,
            ClearingMessage::CreditResult {
                id: "TX-5".into(),
                ok: true,
                reason: None
            }
        );
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("1200.00"));
    }

    #[tokio::test]
    async fn test_credit_currency_mismatch_no_mutation() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Credit {
                id: "TX-5".into(),
                to: ACCT.into(),
                amount: dec("200"),
                currency: Currency::USD,
            })
            .await
            .unwrap();

        assert_failed(&reply, "CURRENCY_NOT_SUPPORTED");
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("1000.00"));
    }

    #[tokio::test]
    async fn test_credit_not_permitted() {
        let h = harness(|a| a.permits_credit = false);
        let reply = h
            .participant
            .handle(ClearingMessage::Credit {
                id: "TX-5".into(),
                to: ACCT.into(),
                amount: dec("200"),
                currency: Currency::CRC,
            })
            .await
            .unwrap();
        assert_failed(&reply, "ACCOUNT_NO_CREDIT");
    }

    #[tokio::test]
    async fn test_debit_requires_reservation() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Debit {
                id: "TX-7".into(),
                from: ACCT.into(),
                amount: dec("50"),
            })
            .await
            .unwrap();
        assert_failed(&reply, "DEBIT_FAILED");
    }

    #[tokio::test]
    async fn test_reserve_then_debit_fires_once() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-8", "300")).await.unwrap();

        let debit = ClearingMessage::Debit {
            id: "TX-8".into(),
            from: ACCT.into(),
            amount: dec("300"),
        };
        let first = h.participant.handle(debit.clone()).await.unwrap();
        assert_eq!(
            first,
            ClearingMessage::DebitResult {
                id: "TX-8".into(),
                ok: true,
                reason: None
            }
        );

        // Replay must not debit a second time.
        let second = h.participant.handle(debit).await.unwrap();
        assert_failed(&second, "DEBIT_FAILED");

        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("700.00"));
        assert_eq!(snap.held, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_rollback_releases_hold() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-9", "300")).await.unwrap();

        let reply = h
            .participant
            .handle(ClearingMessage::Rollback {
                id: "TX-9".into(),
                to: ACCT.into(),
                amount: dec("300"),
            })
            .await
            .unwrap();
        assert_eq!(
            reply,
            ClearingMessage::RollbackResult {
                id: "TX-9".into(),
                ok: true,
                reason: None
            }
        );

        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("1000.00"));
        assert_eq!(snap.available(), dec("1000.00"));
    }

    #[tokio::test]
    async fn test_rollback_after_debit_rejected() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-10", "300")).await.unwrap();
        h.participant
            .handle(ClearingMessage::Debit {
                id: "TX-10".into(),
                from: ACCT.into(),
                amount: dec("300"),
            })
            .await
            .unwrap();

        let reply = h
            .participant
            .handle(ClearingMessage::Rollback {
                id: "TX-10".into(),
                to: ACCT.into(),
                amount: dec("300"),
            })
            .await
            .unwrap();

        // The debited amount must stay debited; no credit-back here.
        assert_failed(&reply, "ROLLBACK_FAILED");
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("700.00"));
    }

    #[tokio::test]
    async fn test_debit_after_rollback_rejected() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-11", "300")).await.unwrap();
        h.participant
            .handle(ClearingMessage::Rollback {
                id: "TX-11".into(),
                to: ACCT.into(),
                amount: dec("300"),
            })
            .await
            .unwrap();

        let reply = h
            .participant
            .handle(ClearingMessage::Debit {
                id: "TX-11".into(),
                from: ACCT.into(),
                amount: dec("300"),
            })
            .await
            .unwrap();

        assert_failed(&reply, "DEBIT_FAILED");
        let snap = h.ledger.snapshot(&AccountNumber::parse(ACCT).unwrap()).unwrap();
        assert_eq!(snap.balance, dec("1000.00"));
    }

    #[tokio::test]
    async fn test_debit_amount_mismatch_rejected() {
        let h = harness(|_| {});
        h.participant.handle(reserve("TX-12", "300")).await.unwrap();

        let reply = h
            .participant
            .handle(ClearingMessage::Debit {
                id: "TX-12".into(),
                from: ACCT.into(),
                amount: dec("301"),
            })
            .await
            .unwrap();
        assert_failed(&reply, "DEBIT_FAILED");
    }

    #[tokio::test]
    async fn test_non_participant_message_ignored() {
        let h = harness(|_| {});
        let reply = h
            .participant
            .handle(ClearingMessage::Commit { id: "TX-1".into() })
            .await;
        assert!(reply.is_none());
    }
}
