use crate::error::SyncError;
use async_trait::async_trait;

/// Result of one claim-fetch-persist cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing is claimable right now.
    Idle,
    Completed { block: i64, transactions: usize },
    Failed { block: i64, error: String },
}

/// What a chain family has to provide to be driven by the scheduler.
///
/// `one_cycle` only returns `Err` for conditions that make further cycles pointless
/// (the lease queue itself is unreachable). Failures of the claimed block are reported
/// through [`CycleOutcome::Failed`] after the lease has been released.
#[async_trait]
pub trait ChainParser: Send + Sync {
    type Block: Send + Sync;
    type Tx: Send + Sync;
    type Receipt: Send + Sync;

    fn chain_id(&self) -> &str;

    /// Make sure the lease queue covers every block up to the chain cursor.
    async fn refresh_tasks(&self) -> Result<u64, SyncError>;

    async fn one_cycle(&self) -> Result<CycleOutcome, SyncError>;

    async fn block_data_from_peer(&self, block: i64) -> Result<Self::Block, SyncError>;

    async fn parse_tx(&self, tx: &Self::Tx, receipt: &Self::Receipt, timestamp: i64) -> Result<(), SyncError>;
}
