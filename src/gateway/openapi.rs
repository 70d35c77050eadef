//! OpenAPI document
//!
//! Served at `/api/v1/openapi.json`; no bundled UI.

use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use super::handlers;
use super::types::{ApiErrorBody, InterbankAccepted, MessageResponse};
use crate::account::Currency;
use crate::internal_transfer::MovementKind;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "bancore API",
        description = "Retail-banking backend: internal and interbank transfers",
    ),
    paths(
        handlers::health::health_check,
        handlers::transfer::create_internal_transfer,
        handlers::transfer::create_interbank_transfer,
    ),
    components(schemas(
        MessageResponse,
        InterbankAccepted,
        ApiErrorBody,
        Currency,
        MovementKind,
        handlers::health::HealthResponse,
        handlers::transfer::InternalTransferBody,
        handlers::transfer::InterbankTransferBody,
    )),
    tags(
        (name = "Transfers", description = "Money movement"),
        (name = "System", description = "Service health")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Document with the bearer security scheme attached
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(components) = doc.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_all_routes() {
        let doc = ApiDoc::build();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.ends_with("/health")));
        assert!(paths.iter().any(|p| p.ends_with("/transfers/internal")));
        assert!(paths.iter().any(|p| p.ends_with("/transfers/interbank")));
    }
}
