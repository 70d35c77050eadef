//! Account-number validation
//!
//! Every identifier entering the backend, from HTTP bodies or from the
//! clearing channel, passes through [`AccountNumber::parse`] before any
//! comparison, lookup, or transmission. The field is private to make an
//! unvalidated number unrepresentable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire layout: country+check prefix, bank code, account tail.
const COUNTRY: &str = "CR";
const CHECK_LEN: usize = 2;
const BANK_CODE_LEN: usize = 8;
const TAIL_LEN: usize = 12;
const TOTAL_LEN: usize = COUNTRY.len() + CHECK_LEN + BANK_CODE_LEN + TAIL_LEN;

/// Validation errors for account numbers
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Account number must be {expected} characters after normalization, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Account number must start with '{COUNTRY}' followed by 2 check digits: got '{got}'")]
    InvalidPrefix { got: String },

    #[error("Account number body must be numeric: got '{got}'")]
    NonNumericBody { got: String },
}

/// Validated account number (normalized, fixed-pattern checked)
///
/// Normalization strips whitespace and hyphens and upper-cases, so
/// `"cr21 0000-0107 …"` and `"CR210000 0107…"` compare equal. The pattern
/// gate is `CR` + 2 check digits + 8-digit bank code + 12-digit tail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Normalize and validate a raw account identifier
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.len() != TOTAL_LEN {
            return Err(ValidationError::InvalidLength {
                expected: TOTAL_LEN,
                actual: normalized.len(),
            });
        }

        let (prefix, body) = normalized.split_at(COUNTRY.len() + CHECK_LEN);
        if !prefix.starts_with(COUNTRY)
            || !prefix[COUNTRY.len()..].chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidPrefix {
                got: prefix.to_string(),
            });
        }

        if !body.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NonNumericBody {
                got: body.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    /// The 8-digit segment identifying the owning bank
    pub fn bank_code(&self) -> &str {
        &self.0[COUNTRY.len() + CHECK_LEN..COUNTRY.len() + CHECK_LEN + BANK_CODE_LEN]
    }

    /// Normalized form, as sent on the wire
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccountNumber> for String {
    fn from(n: AccountNumber) -> String {
        n.0
    }
}
