use crate::blockchain::abi::AbiError;
use crate::blockchain::client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Peer error: {0}")]
    Client(#[from] ClientError),

    #[error("Decode error: {0}")]
    Abi(#[from] AbiError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Block {0} not found on peer")]
    BlockNotFound(i64),

    #[error("Receipt for {0} not found on peer")]
    ReceiptNotFound(String),

    #[error("Token {contract} returned no usable {field}")]
    IncompleteTokenMetadata { contract: String, field: &'static str },

    #[error("No native currency configured for chain {0}")]
    NativeCurrencyMissing(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}
