//! In-memory ledger
//!
//! Mirrors the stored-procedure contract over a process-local map. Each
//! operation takes the table lock once, so the same atomicity the store
//! guarantees holds here. Used by the test suites and by offline demo runs.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{LedgerAdapter, LedgerError};
use crate::account::{Account, AccountNumber, Currency};
use crate::internal_transfer::MovementKind;

/// Process-local ledger with the same semantics as the store
#[derive(Default)]
pub struct MemoryLedger {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account (test setup)
    pub fn insert(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.number.as_str().to_string(), account);
    }

    /// Current snapshot of one account (test assertions)
    pub fn snapshot(&self, number: &AccountNumber) -> Option<Account> {
        self.accounts.lock().unwrap().get(number.as_str()).cloned()
    }
}

#[async_trait]
impl LedgerAdapter for MemoryLedger {
    async fn fetch_account(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerError> {
        Ok(self.accounts.lock().unwrap().get(number.as_str()).cloned())
    }

    async fn transfer(
        &self,
        origin: &AccountNumber,
        destination: &AccountNumber,
        _kind: MovementKind,
        currency: Currency,
        amount: Decimal,
        _description: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut table = self.accounts.lock().unwrap();

        {
            let from = table
                .get(origin.as_str())
                .ok_or(LedgerError::AccountNotFound)?;
            let to = table
                .get(destination.as_str())
                .ok_or(LedgerError::AccountNotFound)?;

            if !from.can_debit() {
                return Err(LedgerError::DebitNotPermitted);
            }
            if !to.can_credit() {
                return Err(LedgerError::CreditNotPermitted);
            }
            if from.currency != currency || to.currency != currency {
                return Err(LedgerError::CurrencyMismatch);
            }
            if from.available() < amount {
                return Err(LedgerError::InsufficientFunds);
            }
        }

        // Both checks passed under the same lock; apply both legs together.
        table.get_mut(origin.as_str()).unwrap().balance -= amount;
        table.get_mut(destination.as_str()).unwrap().balance += amount;
        Ok(())
    }

    async fn credit(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        let mut table = self.accounts.lock().unwrap();
        let account = table
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        if !account.can_credit() {
            return Err(LedgerError::CreditNotPermitted);
        }
        account.balance += amount;
        Ok(())
    }

    async fn hold(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        let mut table = self.accounts.lock().unwrap();
        let account = table
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        if !account.can_debit() {
            return Err(LedgerError::DebitNotPermitted);
        }
        if account.available() < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        account.held += amount;
        Ok(())
    }

    async fn capture(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        let mut table = self.accounts.lock().unwrap();
        let account = table
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        if account.held < amount {
            return Err(LedgerError::HoldNotFound);
        }
        account.held -= amount;
        account.balance -= amount;
        Ok(())
    }

    async fn release(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        let mut table = self.accounts.lock().unwrap();
        let account = table
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        if account.held < amount {
            return Err(LedgerError::HoldNotFound);
        }
        account.held -= amount;
        Ok(())
    }
}
