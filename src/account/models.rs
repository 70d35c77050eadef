//! Data models for customer accounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::AccountNumber;

/// Supported currencies
///
/// The ledger store enforces single-currency accounts; the closed set here
/// must match the `currency` check constraint in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Currency {
    CRC,
    USD,
    EUR,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::CRC => "CRC",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CRC" => Some(Currency::CRC),
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum AccountStatus {
    Blocked = 0,
    Active = 1,
}

impl From<i16> for AccountStatus {
    fn from(v: i16) -> Self {
        match v {
            0 => AccountStatus::Blocked,
            _ => AccountStatus::Active,
        }
    }
}

/// Customer account snapshot
///
/// Read-only view of a ledger row. `held` is the amount currently reserved
/// for in-flight interbank transfers; `available()` is what a debit or a new
/// hold may draw on. Balances are never mutated through this type; every
/// mutation is an atomic ledger operation.
#[derive(Debug, Clone)]
pub struct Account {
    pub number: AccountNumber,
    pub owner_id: i64,
    pub currency: Currency,
    pub balance: Decimal,
    pub held: Decimal,
    pub permits_debit: bool,
    pub permits_credit: bool,
    pub status: AccountStatus,
}

impl Account {
    /// Balance available to debits and new holds
    pub fn available(&self) -> Decimal {
        self.balance - self.held
    }

    /// Whether the account can be debited right now
    pub fn can_debit(&self) -> bool {
        self.status == AccountStatus::Active && self.permits_debit
    }

    /// Whether the account can receive credits right now
    pub fn can_credit(&self) -> bool {
        self.status == AccountStatus::Active && self.permits_credit
    }
}
