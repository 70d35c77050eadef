//! HTTP gateway
//!
//! Public surface of the backend: health plus the two transfer endpoints.
//! Private routes sit behind the bearer-token middleware.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::jwt_auth_middleware;
use state::AppState;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let private = Router::new()
        .route(
            "/api/v1/transfers/internal",
            post(handlers::transfer::create_internal_transfer),
        )
        .route(
            "/api/v1/transfers/interbank",
            post(handlers::transfer::create_interbank_transfer),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health::health_check))
        .route(
            "/api/v1/openapi.json",
            get(|| async { Json(openapi::ApiDoc::build()) }),
        )
        .merge(private)
        .with_state(state)
}

/// Bind and serve until the process exits
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
