//! API response types and error mapping
//!
//! Error bodies carry a short closed-set `reason` code plus a human-readable
//! message. Raw internal detail is logged at the conversion point and never
//! serialized to the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::clearing::InterbankError;
use crate::internal_transfer::InternalTransferError;

/// Handler result: a JSON body or a mapped error
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Plain acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Transfer applied")]
    pub message: String,
}

/// Interbank transfer acknowledgement
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterbankAccepted {
    #[schema(example = "Transfer committed")]
    pub message: String,
    #[schema(example = "7e2f6c4a-1b0d-4f3e-9a57-2f9d52a6f0cd")]
    pub transaction_id: String,
}

/// Error body: message plus a stable reason code
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    #[schema(example = "Insufficient funds in the source account")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "NO_FUNDS")]
    pub reason: Option<&'static str>,
}

/// API error with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub reason: Option<&'static str>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: Some(reason),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Unexpected internal error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            message: self.message,
            reason: self.reason,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<InterbankError> for ApiError {
    fn from(e: InterbankError) -> Self {
        if let InterbankError::Internal(detail) = &e {
            tracing::error!(detail = %detail, "Interbank transfer failed internally");
            return ApiError::internal();
        }

        let message = match &e {
            InterbankError::Rejected(reason) => reason.user_message().to_string(),
            other => other.to_string(),
        };
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, e.code(), message)
    }
}

impl From<InternalTransferError> for ApiError {
    fn from(e: InternalTransferError) -> Self {
        if let InternalTransferError::Internal(detail) = &e {
            tracing::error!(detail = %detail, "Internal transfer failed internally");
            return ApiError::internal();
        }

        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, e.code(), e.to_string())
    }
}
