//! PostgreSQL ledger adapter
//!
//! Thin translation layer over the store's stored procedures. The procedures
//! own atomicity and the business checks (flags, funds, currency); each one
//! returns a status code that this adapter maps onto [`LedgerError`].
//!
//! Procedure contract (status codes):
//!
//! ```text
//! ledger_transfer(origin, destination, kind, currency, amount, description)
//!     -> OK | ACCOUNT_NOT_FOUND | NO_FUNDS | NO_DEBIT | NO_CREDIT | CURRENCY_MISMATCH
//! ledger_credit(account, amount)   -> OK | ACCOUNT_NOT_FOUND | NO_CREDIT
//! ledger_hold(account, amount)     -> OK | ACCOUNT_NOT_FOUND | NO_DEBIT | NO_FUNDS
//! ledger_capture(account, amount)  -> OK | ACCOUNT_NOT_FOUND | HOLD_NOT_FOUND
//! ledger_release(account, amount)  -> OK | ACCOUNT_NOT_FOUND | HOLD_NOT_FOUND
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use super::{LedgerAdapter, LedgerError};
use crate::account::{Account, AccountNumber, AccountStatus, Currency};
use crate::internal_transfer::MovementKind;

/// Ledger adapter backed by the PostgreSQL store
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_status(status: &str) -> Result<(), LedgerError> {
        match status {
            "OK" => Ok(()),
            "ACCOUNT_NOT_FOUND" => Err(LedgerError::AccountNotFound),
            "NO_FUNDS" => Err(LedgerError::InsufficientFunds),
            "NO_DEBIT" => Err(LedgerError::DebitNotPermitted),
            "NO_CREDIT" => Err(LedgerError::CreditNotPermitted),
            "CURRENCY_MISMATCH" => Err(LedgerError::CurrencyMismatch),
            "HOLD_NOT_FOUND" => Err(LedgerError::HoldNotFound),
            other => Err(LedgerError::Storage(format!(
                "unexpected procedure status: {other}"
            ))),
        }
    }

    async fn call_two_arg(
        &self,
        procedure: &str,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let status = sqlx::query_scalar::<_, String>(&format!("SELECT {procedure}($1, $2)"))
            .bind(number.as_str())
            .bind(amount)
            .fetch_one(&self.pool)
            .await?;
        Self::map_status(&status)
    }
}

#[async_trait]
impl LedgerAdapter for PgLedger {
    async fn fetch_account(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerError> {
        let row = sqlx::query(
            r#"SELECT account_number, owner_id, currency, balance, held,
                      permits_debit, permits_credit, status
               FROM accounts WHERE account_number = $1"#,
        )
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let currency_code: String = r.get("currency");
            let currency = Currency::from_code(&currency_code).ok_or_else(|| {
                LedgerError::Storage(format!("unknown currency in store: {currency_code}"))
            })?;
            let raw_number: String = r.get("account_number");
            let number = AccountNumber::parse(&raw_number)
                .map_err(|e| LedgerError::Storage(format!("malformed number in store: {e}")))?;

            Ok(Account {
                number,
                owner_id: r.get("owner_id"),
                currency,
                balance: r.get("balance"),
                held: r.get("held"),
                permits_debit: r.get("permits_debit"),
                permits_credit: r.get("permits_credit"),
                status: AccountStatus::from(r.get::<i16, _>("status")),
            })
        })
        .transpose()
    }

    async fn transfer(
        &self,
        origin: &AccountNumber,
        destination: &AccountNumber,
        kind: MovementKind,
        currency: Currency,
        amount: Decimal,
        description: Option<&str>,
    ) -> Result<(), LedgerError> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT ledger_transfer($1, $2, $3, $4, $5, $6)",
        )
        .bind(origin.as_str())
        .bind(destination.as_str())
        .bind(kind.as_str())
        .bind(currency.as_str())
        .bind(amount)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Self::map_status(&status)
    }

    async fn credit(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        self.call_two_arg("ledger_credit", number, amount).await
    }

    async fn hold(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        self.call_two_arg("ledger_hold", number, amount).await
    }

    async fn capture(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        self.call_two_arg("ledger_capture", number, amount).await
    }

    async fn release(&self, number: &AccountNumber, amount: Decimal) -> Result<(), LedgerError> {
        self.call_two_arg("ledger_release", number, amount).await
    }
}
