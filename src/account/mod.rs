//! Account data model and identifier validation
//!
//! Accounts live in the ledger store; this module only defines the shapes
//! the rest of the backend moves around, plus the validated account-number
//! type every identifier must pass through before use.

pub mod models;
pub mod validation;

pub use models::{Account, AccountStatus, Currency};
pub use validation::{AccountNumber, ValidationError};
