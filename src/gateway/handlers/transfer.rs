//! Transfer handlers
//!
//! Two endpoints, two very different latency profiles: the internal transfer
//! resolves in one ledger call; the interbank transfer suspends the request
//! until the clearinghouse confirms, rejects, or the coordinator times out.

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiErrorBody, ApiResult, InterbankAccepted, MessageResponse};
use crate::account::Currency;
use crate::auth::AuthenticatedUser;
use crate::clearing::TransferIntent;
use crate::internal_transfer::{InternalTransferRequest, MovementKind};

/// Internal (same-bank) transfer request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalTransferBody {
    #[schema(example = "CR21-00000107-000000000001")]
    pub origin: String,
    #[schema(example = "CR21-00000107-000000000002")]
    pub destination: String,
    pub movement_kind: MovementKind,
    pub currency: Currency,
    #[schema(value_type = String, example = "2500.00")]
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Interbank transfer request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterbankTransferBody {
    #[schema(example = "CR21-00000107-000000000001")]
    pub from: String,
    #[schema(example = "CR84-00000208-000000000777")]
    pub to: String,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    pub currency: Currency,
    pub description: Option<String>,
}

/// Same-bank transfer: one atomic ledger call
///
/// POST /api/v1/transfers/internal
#[utoipa::path(
    post,
    path = "/api/v1/transfers/internal",
    request_body = InternalTransferBody,
    responses(
        (status = 200, description = "Transfer applied", body = MessageResponse),
        (status = 400, description = "Malformed request", body = ApiErrorBody),
        (status = 401, description = "Authentication failed", body = ApiErrorBody),
        (status = 403, description = "Origin account not owned by caller", body = ApiErrorBody),
        (status = 422, description = "Business rule rejected the transfer", body = ApiErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transfers"
)]
pub async fn create_internal_transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<InternalTransferBody>,
) -> ApiResult<MessageResponse> {
    state
        .internal
        .execute(
            user.user_id,
            InternalTransferRequest {
                origin: body.origin,
                destination: body.destination,
                kind: body.movement_kind,
                currency: body.currency,
                amount: body.amount,
                description: body.description,
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Transfer applied".to_string(),
    }))
}

/// Interbank transfer through the clearinghouse
///
/// POST /api/v1/transfers/interbank
///
/// The response is the terminal outcome: 200 on commit with the transaction
/// id, 409 with a closed-set reason on rejection or timeout (a timeout means
/// the final outcome is unknown, not that the transfer failed), 503 when the
/// clearing channel is down.
#[utoipa::path(
    post,
    path = "/api/v1/transfers/interbank",
    request_body = InterbankTransferBody,
    responses(
        (status = 200, description = "Transfer committed", body = InterbankAccepted),
        (status = 400, description = "Malformed request", body = ApiErrorBody),
        (status = 401, description = "Authentication failed", body = ApiErrorBody),
        (status = 409, description = "Transfer rejected or outcome unknown", body = ApiErrorBody),
        (status = 503, description = "Clearing channel down", body = ApiErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transfers"
)]
pub async fn create_interbank_transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<InterbankTransferBody>,
) -> ApiResult<InterbankAccepted> {
    let id = state
        .interbank
        .submit(
            user.user_id,
            TransferIntent {
                from: body.from,
                to: body.to,
                amount: body.amount,
                currency: body.currency,
                description: body.description,
            },
        )
        .await?;

    Ok(Json(InterbankAccepted {
        message: "Transfer committed".to_string(),
        transaction_id: id.as_str().to_string(),
    }))
}
