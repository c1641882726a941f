// Configuration for the sync service:
// - peer RPC endpoint and limits
// - database connection string
// - status server address/port
// - lease queue tuning (TTL, retries, backfill chunk size)
// - token icon catalog and balance projection mode

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How token transfers are projected onto `account_currencies.balance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMode {
    /// Balance is overwritten with the latest observed transfer amount.
    Overwrite,
    /// Balance is credited/debited once per newly recorded transfer.
    Accumulate,
}

impl FromStr for BalanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(BalanceMode::Overwrite),
            "accumulate" => Ok(BalanceMode::Accumulate),
            other => Err(format!("unknown balance mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub blockchain_id: String,
    pub eth_rpc_url: String,
    pub rpc_timeout_secs: u64,
    pub rpc_rate_limit: Option<u32>,
    pub polling_interval_secs: u64,
    pub lease_ttl_secs: i64,
    pub max_retry: i64,
    pub backfill_batch_size: i64,
    pub sync_start_block: i64,
    pub track_chain_head: bool,
    pub icon_base_url: String,
    pub icon_timeout_ms: u64,
    pub default_icon_url: String,
    pub balance_mode: BalanceMode,
    pub currency_cache_capacity: u64,
    pub native_name: String,
    pub native_symbol: String,
    pub native_decimals: i64,
}

/// The part of [`Config`] the sync engine itself consumes.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub blockchain_id: String,
    pub lease_ttl: Duration,
    pub max_retry: i64,
    pub backfill_batch_size: i64,
    pub sync_start_block: i64,
    pub track_chain_head: bool,
    pub balance_mode: BalanceMode,
    pub currency_cache_capacity: u64,
}

impl SyncSettings {
    pub fn new(blockchain_id: impl Into<String>) -> Self {
        Self {
            blockchain_id: blockchain_id.into(),
            lease_ttl: Duration::from_secs(86_400),
            max_retry: 3,
            backfill_batch_size: 10_000,
            sync_start_block: 0,
            track_chain_head: false,
            balance_mode: BalanceMode::Overwrite,
            currency_cache_capacity: 1000,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:ledger.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env_or("SERVER_PORT", 8080);
        let blockchain_id = env::var("CHAIN_ID").unwrap_or_else(|_| "8000003C".to_string());
        let eth_rpc_url = env::var("ETH_RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());
        let rpc_timeout_secs = env_or("RPC_TIMEOUT_SECS", 30);
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let polling_interval_secs = env_or("POLLING_INTERVAL_SECS", 10);
        let lease_ttl_secs = env_or("LEASE_TTL_SECS", 86_400);
        let max_retry = env_or("MAX_RETRY", 3);
        let backfill_batch_size = env_or("BACKFILL_BATCH_SIZE", 10_000);
        let sync_start_block = env_or("SYNC_START_BLOCK", 0);
        let track_chain_head = env_or("TRACK_CHAIN_HEAD", false);
        let icon_base_url = env::var("ICON_BASE_URL").unwrap_or_else(|_| {
            "https://cdn.jsdelivr.net/gh/atomiclabs/cryptocurrency-icons@9ab8d6934b83a4aa8ae5e8711609a70ca0ab1b2b/32/icon".to_string()
        });
        let icon_timeout_ms = env_or("ICON_TIMEOUT_MS", 1000);
        let service_domain = env::var("SERVICE_DOMAIN").unwrap_or_else(|_| "http://127.0.0.1".to_string());
        let default_icon_url =
            env::var("DEFAULT_ICON_URL").unwrap_or_else(|_| format!("{}/icon/ERC20.png", service_domain));
        let balance_mode = env_or("BALANCE_MODE", BalanceMode::Overwrite);
        let currency_cache_capacity = env_or("CURRENCY_CACHE_CAPACITY", 1000);
        let native_name = env::var("NATIVE_NAME").unwrap_or_else(|_| "Ethereum".to_string());
        let native_symbol = env::var("NATIVE_SYMBOL").unwrap_or_else(|_| "ETH".to_string());
        let native_decimals = env_or("NATIVE_DECIMALS", 18);

        Self {
            database_url,
            server_host,
            server_port,
            blockchain_id,
            eth_rpc_url,
            rpc_timeout_secs,
            rpc_rate_limit,
            polling_interval_secs,
            lease_ttl_secs,
            max_retry,
            backfill_batch_size,
            sync_start_block,
            track_chain_head,
            icon_base_url,
            icon_timeout_ms,
            default_icon_url,
            balance_mode,
            currency_cache_capacity,
            native_name,
            native_symbol,
            native_decimals,
        }
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            blockchain_id: self.blockchain_id.clone(),
            lease_ttl: Duration::from_secs(self.lease_ttl_secs.max(0) as u64),
            max_retry: self.max_retry,
            backfill_batch_size: self.backfill_batch_size.max(1),
            sync_start_block: self.sync_start_block,
            track_chain_head: self.track_chain_head,
            balance_mode: self.balance_mode,
            currency_cache_capacity: self.currency_cache_capacity,
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs.max(1))
    }
}
