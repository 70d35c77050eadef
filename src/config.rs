use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub clearing: ClearingConfig,
    /// PostgreSQL connection URL for the ledger store; in-memory ledger when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub jwt_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Clearing channel settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClearingConfig {
    /// WebSocket endpoint of the clearinghouse
    pub url: String,
    /// This bank's 8-digit code; gates which accounts are "ours"
    pub bank_code: String,
    /// How long an initiator waits for a terminal event
    #[serde(default = "default_intent_timeout_ms")]
    pub intent_timeout_ms: u64,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_intent_timeout_ms() -> u64 {
    30_000
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
