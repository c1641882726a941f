pub mod api;
pub mod blockchain;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::route::create_router;
pub use blockchain::{ChainParser, CycleOutcome, EthClient, EthParser, SyncScheduler};
pub use config::{BalanceMode, Config, SyncSettings};
pub use db::connection;
pub use db::lease::LeaseQueue;
pub use error::SyncError;
