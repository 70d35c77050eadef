//! Clearing channel wire protocol
//!
//! Every frame on the duplex channel is a JSON envelope `{type, data}`.
//! [`ClearingMessage`] models the envelope as a tagged enum so dispatch is a
//! single `match` and malformed frames fail at the serde boundary.
//!
//! Reason strings received from the clearinghouse are mapped onto the closed
//! [`RejectReason`] set immediately on receipt; raw remote strings never
//! reach internal control flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::Currency;

/// Transaction identifier
///
/// Generated by the initiating bank and carried verbatim on every message of
/// the transfer. Ids minted elsewhere are opaque; only freshness of our own
/// ids matters, so `generate` uses a UUIDv4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Messages exchanged with the clearinghouse
///
/// Field names and type tags are the channel contract; see the participant
/// and coordinator modules for who produces and consumes each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClearingMessage {
    /// Initiator -> clearinghouse: start a transfer
    #[serde(rename = "transfer.intent")]
    Intent {
        id: String,
        from: String,
        to: String,
        amount: Decimal,
        currency: Currency,
    },

    /// Clearinghouse -> source bank: check and hold funds
    #[serde(rename = "transfer.reserve")]
    Reserve {
        id: String,
        from: String,
        amount: Decimal,
    },

    #[serde(rename = "transfer.reserve.result")]
    ReserveResult {
        id: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Clearinghouse -> destination bank: credit the destination account
    #[serde(rename = "transfer.credit")]
    Credit {
        id: String,
        to: String,
        amount: Decimal,
        currency: Currency,
    },

    #[serde(rename = "transfer.credit.result")]
    CreditResult {
        id: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Clearinghouse -> source bank: finalize the held debit
    #[serde(rename = "transfer.debit")]
    Debit {
        id: String,
        from: String,
        amount: Decimal,
    },

    #[serde(rename = "transfer.debit.result")]
    DebitResult {
        id: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Clearinghouse -> source bank: drop the hold, the transfer failed
    #[serde(rename = "transfer.rollback")]
    Rollback {
        id: String,
        to: String,
        amount: Decimal,
    },

    #[serde(rename = "transfer.rollback.result")]
    RollbackResult {
        id: String,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Clearinghouse -> initiator: the transfer is final
    #[serde(rename = "transfer.commit")]
    Commit { id: String },

    /// Clearinghouse -> initiator: the transfer failed
    #[serde(rename = "transfer.reject")]
    Reject { id: String, reason: String },
}

impl ClearingMessage {
    /// Transaction id carried by this message
    pub fn transaction_id(&self) -> &str {
        match self {
            ClearingMessage::Intent { id, .. }
            | ClearingMessage::Reserve { id, .. }
            | ClearingMessage::ReserveResult { id, .. }
            | ClearingMessage::Credit { id, .. }
            | ClearingMessage::CreditResult { id, .. }
            | ClearingMessage::Debit { id, .. }
            | ClearingMessage::DebitResult { id, .. }
            | ClearingMessage::Rollback { id, .. }
            | ClearingMessage::RollbackResult { id, .. }
            | ClearingMessage::Commit { id }
            | ClearingMessage::Reject { id, .. } => id,
        }
    }
}

/// Closed set of transfer-failure causes
///
/// Both directions use these codes: participant result messages carry them as
/// the `reason` field, and clearinghouse reject reasons are folded into the
/// same set at the channel boundary. `Unrecognized` is the mandatory fallback
/// for remote strings we do not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidPayload,
    UnknownDestinationBank,
    DestinationUnreachable,
    AccountNotFound,
    AccountNoDebit,
    AccountNoCredit,
    CurrencyNotSupported,
    NoFunds,
    ReserveFailed,
    CreditFailed,
    DebitFailed,
    RollbackFailed,
    Timeout,
    Unrecognized,
}

impl RejectReason {
    /// Stable code used on the wire and in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidPayload => "INVALID_PAYLOAD",
            RejectReason::UnknownDestinationBank => "UNKNOWN_BANK",
            RejectReason::DestinationUnreachable => "BANK_UNREACHABLE",
            RejectReason::AccountNotFound => "ACCOUNT_NOT_FOUND",
            RejectReason::AccountNoDebit => "ACCOUNT_NO_DEBIT",
            RejectReason::AccountNoCredit => "ACCOUNT_NO_CREDIT",
            RejectReason::CurrencyNotSupported => "CURRENCY_NOT_SUPPORTED",
            RejectReason::NoFunds => "NO_FUNDS",
            RejectReason::ReserveFailed => "RESERVE_FAILED",
            RejectReason::CreditFailed => "CREDIT_FAILED",
            RejectReason::DebitFailed => "DEBIT_FAILED",
            RejectReason::RollbackFailed => "ROLLBACK_FAILED",
            RejectReason::Timeout => "TIMEOUT",
            RejectReason::Unrecognized => "REJECTED",
        }
    }

    /// Map a remote reason string onto the closed set
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "INVALID_PAYLOAD" => RejectReason::InvalidPayload,
            "UNKNOWN_BANK" => RejectReason::UnknownDestinationBank,
            "BANK_UNREACHABLE" => RejectReason::DestinationUnreachable,
            "ACCOUNT_NOT_FOUND" => RejectReason::AccountNotFound,
            "ACCOUNT_NO_DEBIT" => RejectReason::AccountNoDebit,
            "ACCOUNT_NO_CREDIT" => RejectReason::AccountNoCredit,
            "CURRENCY_NOT_SUPPORTED" => RejectReason::CurrencyNotSupported,
            "NO_FUNDS" => RejectReason::NoFunds,
            "RESERVE_FAILED" => RejectReason::ReserveFailed,
            "CREDIT_FAILED" => RejectReason::CreditFailed,
            "DEBIT_FAILED" => RejectReason::DebitFailed,
            "ROLLBACK_FAILED" => RejectReason::RollbackFailed,
            "TIMEOUT" => RejectReason::Timeout,
            other => {
                tracing::warn!(reason = other, "Unrecognized reject reason from clearinghouse");
                RejectReason::Unrecognized
            }
        }
    }

    /// Human-readable message for API callers
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectReason::InvalidPayload => "The transfer request was malformed",
            RejectReason::UnknownDestinationBank => "The destination bank is not a participant",
            RejectReason::DestinationUnreachable => "The destination bank is unreachable",
            RejectReason::AccountNotFound => "The destination account does not exist",
            RejectReason::AccountNoDebit => "The source account does not permit debits",
            RejectReason::AccountNoCredit => "The destination account cannot receive funds",
            RejectReason::CurrencyNotSupported => {
                "The destination account does not hold this currency"
            }
            RejectReason::NoFunds => "Insufficient funds in the source account",
            RejectReason::ReserveFailed => "The funds reservation failed",
            RejectReason::CreditFailed => "The destination credit failed",
            RejectReason::DebitFailed => "The source debit failed",
            RejectReason::RollbackFailed => "The reservation could not be released",
            RejectReason::Timeout => {
                "No confirmation arrived in time; the final outcome is unknown"
            }
            RejectReason::Unrecognized => "The transfer was rejected by the clearing network",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_envelope_shape() {
        let msg = ClearingMessage::Reserve {
            id: "TX-2".into(),
            from: "CR2100000107000000000001".into(),
            amount: dec("50"),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "transfer.reserve");
        assert_eq!(value["data"]["id"], "TX-2");
        assert_eq!(value["data"]["from"], "CR2100000107000000000001");
    }

    #[test]
    fn test_result_omits_reason_when_ok() {
        let msg = ClearingMessage::ReserveResult {
            id: "TX-2".into(),
            ok: true,
            reason: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_inbound_frame_parses() {
        let frame = r#"{"type":"transfer.reject","data":{"id":"TX-1","reason":"NO_FUNDS"}}"#;
        let msg: ClearingMessage = serde_json::from_str(frame).unwrap();
        assert_eq!(
            msg,
            ClearingMessage::Reject {
                id: "TX-1".into(),
                reason: "NO_FUNDS".into()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let frame = r#"{"type":"transfer.mystery","data":{"id":"TX-1"}}"#;
        assert!(serde_json::from_str::<ClearingMessage>(frame).is_err());
    }

    #[test]
    fn test_roundtrip_commit() {
        let msg = ClearingMessage::Commit { id: "TX-3".into() };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ClearingMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_reason_mapping_is_closed() {
        assert_eq!(RejectReason::from_wire("NO_FUNDS"), RejectReason::NoFunds);
        assert_eq!(
            RejectReason::from_wire("ACCOUNT_NO_DEBIT"),
            RejectReason::AccountNoDebit
        );
        assert_eq!(
            RejectReason::from_wire("SOMETHING_NEW"),
            RejectReason::Unrecognized
        );
    }

    #[test]
    fn test_reason_code_roundtrip() {
        for reason in [
            RejectReason::InvalidPayload,
            RejectReason::UnknownDestinationBank,
            RejectReason::DestinationUnreachable,
            RejectReason::AccountNotFound,
            RejectReason::AccountNoDebit,
            RejectReason::AccountNoCredit,
            RejectReason::CurrencyNotSupported,
            RejectReason::NoFunds,
            RejectReason::ReserveFailed,
            RejectReason::CreditFailed,
            RejectReason::DebitFailed,
            RejectReason::RollbackFailed,
            RejectReason::Timeout,
        ] {
            assert_eq!(RejectReason::from_wire(reason.code()), reason);
        }
    }

    #[test]
    fn test_transaction_id_generate_unique() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);
    }
}
