pub mod abi;
pub mod client;
pub mod events;
pub mod icon;
pub mod ingestor;
pub mod models;
pub mod notify;
pub mod parser;
pub mod projector;
pub mod registry;
pub mod scheduler;

// Re-exports for convenience
pub use client::EthClient;
pub use ingestor::EthParser;
pub use parser::{ChainParser, CycleOutcome};
pub use scheduler::SyncScheduler;
