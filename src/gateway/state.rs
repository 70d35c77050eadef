//! Shared gateway state

use std::sync::Arc;

use crate::auth::AuthService;
use crate::clearing::{ChannelClient, InterbankCoordinator};
use crate::internal_transfer::InternalTransferExecutor;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub internal: Arc<InternalTransferExecutor>,
    pub interbank: Arc<InterbankCoordinator>,
    pub channel: ChannelClient,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        internal: Arc<InternalTransferExecutor>,
        interbank: Arc<InterbankCoordinator>,
        channel: ChannelClient,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            internal,
            interbank,
            channel,
            auth,
        }
    }
}
