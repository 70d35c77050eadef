//! bancore entry point
//!
//! Wiring order follows the dependency graph: ledger and journal first, then
//! the clearing stack (correlation, participant, channel), then the HTTP
//! gateway. The channel runner reconnects on its own; the gateway fails fast
//! while the link is down.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use bancore::auth::AuthService;
use bancore::clearing::{
    CorrelationTable, InterbankCoordinator, MemoryJournal, Participant, PgJournal,
    TransferJournal, build_channel,
};
use bancore::config::AppConfig;
use bancore::gateway::{self, state::AppState};
use bancore::internal_transfer::InternalTransferExecutor;
use bancore::ledger::{LedgerAdapter, MemoryLedger, PgLedger};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(&get_env());
    let _guard = bancore::logging::init_logging(&config);

    let (ledger, journal): (Arc<dyn LedgerAdapter>, Arc<dyn TransferJournal>) =
        match &config.postgres_url {
            Some(url) => {
                let pool = PgPoolOptions::new().max_connections(16).connect(url).await?;
                info!("Connected to ledger store");
                (
                    Arc::new(PgLedger::new(pool.clone())),
                    Arc::new(PgJournal::new(pool)),
                )
            }
            None => {
                warn!("No postgres_url configured; using in-memory ledger");
                (Arc::new(MemoryLedger::new()), Arc::new(MemoryJournal::new()))
            }
        };

    let correlation = Arc::new(CorrelationTable::new());
    let participant = Arc::new(Participant::new(ledger.clone(), journal.clone()));
    let (channel, runner) = build_channel(
        config.clearing.url.clone(),
        Duration::from_millis(config.clearing.reconnect_delay_ms),
        correlation.clone(),
        participant,
    );
    tokio::spawn(runner.run());

    let internal = Arc::new(InternalTransferExecutor::new(
        ledger.clone(),
        config.clearing.bank_code.clone(),
    ));
    let interbank = Arc::new(InterbankCoordinator::new(
        channel.clone(),
        correlation,
        ledger,
        journal,
        config.clearing.bank_code.clone(),
        Duration::from_millis(config.clearing.intent_timeout_ms),
    ));
    let auth = Arc::new(AuthService::new(config.jwt_secret.clone()));

    let state = Arc::new(AppState::new(internal, interbank, channel, auth));
    gateway::serve(state, &config.gateway.host, config.gateway.port).await
}
