use crate::blockchain::abi::{parse_quantity, parse_u256};
use crate::blockchain::client::{ClientError, EthClient};
use crate::blockchain::events::ReceiptEventParser;
use crate::blockchain::icon::IconResolver;
use crate::blockchain::models::{BlockPayload, ReceiptPayload, TransactionPayload};
use crate::blockchain::notify::{JobNotifier, JobOutcome};
use crate::blockchain::parser::{ChainParser, CycleOutcome};
use crate::blockchain::projector::LedgerProjector;
use crate::blockchain::registry::CurrencyRegistry;
use crate::config::SyncSettings;
use crate::db::block::{self, NewBlock};
use crate::db::currency;
use crate::db::cursor;
use crate::db::lease::LeaseQueue;
use crate::db::transaction::{self, NewReceipt, NewTransaction};
use crate::error::SyncError;
use crate::models::{Block, Currency};
use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const SERVICE: &str = "ingestor";

/// Block ingestor for EVM chains: claims a block, fetches it with its receipts and writes
/// everything through idempotent upserts.
pub struct EthParser {
    pool: SqlitePool,
    settings: SyncSettings,
    client: Arc<EthClient>,
    lease: LeaseQueue,
    events: ReceiptEventParser,
    projector: LedgerProjector,
    native: Currency,
    notifier: Option<Arc<dyn JobNotifier>>,
}

impl EthParser {
    pub async fn new(
        pool: SqlitePool,
        client: Arc<EthClient>,
        icons: IconResolver,
        settings: SyncSettings,
    ) -> Result<Self, SyncError> {
        let native = currency::find_native(&pool, &settings.blockchain_id)
            .await?
            .ok_or_else(|| SyncError::NativeCurrencyMissing(settings.blockchain_id.clone()))?;

        let projector = LedgerProjector::new(pool.clone(), &settings.blockchain_id, settings.balance_mode);
        let registry = CurrencyRegistry::new(
            pool.clone(),
            &settings.blockchain_id,
            client.clone(),
            icons,
            settings.currency_cache_capacity,
        );
        let events = ReceiptEventParser::new(pool.clone(), registry, projector.clone());
        let lease = LeaseQueue::new(pool.clone(), &settings);

        Ok(Self {
            pool,
            settings,
            client,
            lease,
            events,
            projector,
            native,
            notifier: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn JobNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn lease(&self) -> &LeaseQueue {
        &self.lease
    }

    pub fn native_currency(&self) -> &Currency {
        &self.native
    }

    pub async fn insert_block(&self, payload: &BlockPayload) -> Result<Block, SyncError> {
        debug!(service = SERVICE, hash = %payload.hash, "insert block");

        let txids: Vec<&str> = payload.transactions.iter().map(|tx| tx.hash.as_str()).collect();
        let difficulty = payload
            .difficulty
            .as_deref()
            .map(parse_u256)
            .transpose()?
            .map(|d| d.to_string());

        let new_block = NewBlock {
            blockchain_id: self.settings.blockchain_id.clone(),
            block: parse_quantity(&payload.number)?,
            block_hash: payload.hash.clone(),
            timestamp: parse_quantity(&payload.timestamp)?,
            result: json!(txids).to_string(),
            transaction_count: txids.len() as i64,
            miner: payload.miner.clone(),
            difficulty,
            transactions_root: payload.transactions_root.clone(),
            size: payload.size.as_deref().map(parse_quantity).transpose()?,
            gas_used: payload.gas_used.as_deref().map(parse_quantity).transpose()?,
            extra_data: payload.extra_data.clone(),
            uncles: json!(payload.uncles).to_string(),
        };

        Ok(block::upsert_block(&self.pool, &new_block).await?)
    }

    pub async fn receipt_from_peer(&self, txid: &str) -> Result<ReceiptPayload, SyncError> {
        self.client
            .get_transaction_receipt(txid)
            .await?
            .ok_or_else(|| SyncError::ReceiptNotFound(txid.to_string()))
    }

    async fn sync_block(&self, block: i64) -> Result<usize, SyncError> {
        let payload = self.block_data_from_peer(block).await?;
        self.insert_block(&payload).await?;

        let timestamp = parse_quantity(&payload.timestamp)?;
        // Strictly in block order: balance projection depends on it
        for tx in &payload.transactions {
            let receipt = self.receipt_from_peer(&tx.hash).await?;
            self.parse_tx(tx, &receipt, timestamp).await?;
        }

        self.lease.complete(block).await?;
        Ok(payload.transactions.len())
    }

    async fn notify(&self, block: i64, error: Option<String>) {
        if let Some(notifier) = &self.notifier {
            notifier
                .notify(JobOutcome {
                    blockchain_id: self.settings.blockchain_id.clone(),
                    block,
                    success: error.is_none(),
                    error,
                })
                .await;
        }
    }
}

#[async_trait]
impl ChainParser for EthParser {
    type Block = BlockPayload;
    type Tx = TransactionPayload;
    type Receipt = ReceiptPayload;

    fn chain_id(&self) -> &str {
        &self.settings.blockchain_id
    }

    async fn refresh_tasks(&self) -> Result<u64, SyncError> {
        let chain_id = &self.settings.blockchain_id;

        if self.settings.track_chain_head {
            match self.client.block_number().await {
                Ok(head) => {
                    let cursor = cursor::advance_cursor(&self.pool, chain_id, head).await?;
                    debug!(service = SERVICE, chain_id = %chain_id, head, cursor, "chain cursor refreshed");
                }
                Err(e) => warn!(service = SERVICE, chain_id = %chain_id, "could not read chain head: {}", e),
            }
        }

        match cursor::get_cursor(&self.pool, chain_id).await? {
            Some(upper_bound) => Ok(self.lease.backfill(upper_bound).await?),
            None => Ok(0),
        }
    }

    async fn one_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let chain_id = &self.settings.blockchain_id;

        let Some(block) = self.lease.claim().await? else {
            debug!(service = SERVICE, chain_id = %chain_id, "All processing or all done.");
            return Ok(CycleOutcome::Idle);
        };

        match self.sync_block(block).await {
            Ok(transactions) => {
                info!(service = SERVICE, chain_id = %chain_id, block, transactions, "block synchronized");
                self.notify(block, None).await;
                Ok(CycleOutcome::Completed { block, transactions })
            }
            Err(err) => {
                error!(service = SERVICE, chain_id = %chain_id, block, "oneCycle error: {}", err);
                if let Err(reset) = self.lease.fail(block).await {
                    error!(service = SERVICE, chain_id = %chain_id, block, "failed to release lease: {}", reset);
                }
                let error = err.to_string();
                self.notify(block, Some(error.clone())).await;
                Ok(CycleOutcome::Failed { block, error })
            }
        }
    }

    async fn block_data_from_peer(&self, block: i64) -> Result<BlockPayload, SyncError> {
        debug!(service = SERVICE, block, "block data from peer");
        self.client
            .get_block_by_number(block)
            .await?
            .ok_or(SyncError::BlockNotFound(block))
    }

    async fn parse_tx(
        &self,
        tx: &TransactionPayload,
        receipt: &ReceiptPayload,
        timestamp: i64,
    ) -> Result<(), SyncError> {
        debug!(service = SERVICE, txid = %tx.hash, "parse tx");

        let amount = parse_u256(&tx.value)?;
        let gas_price = tx
            .gas_price
            .as_deref()
            .or(receipt.effective_gas_price.as_deref())
            .map(parse_u256)
            .transpose()?
            .unwrap_or(U256::ZERO);
        let gas_used = parse_u256(&receipt.gas_used)?;
        let fee = gas_price
            .checked_mul(gas_used)
            .ok_or_else(|| SyncError::Overflow(format!("fee of {}", tx.hash)))?;

        let block_number = tx
            .block_number
            .as_deref()
            .or(receipt.block_number.as_deref())
            .ok_or_else(|| ClientError::Malformed(format!("transaction {} has no block number", tx.hash)))?;

        let stored_tx = transaction::upsert_transaction(
            &self.pool,
            &NewTransaction {
                currency_id: self.native.currency_id.clone(),
                txid: tx.hash.clone(),
                timestamp,
                source_addresses: tx.from.clone(),
                destination_addresses: tx.to.clone().unwrap_or_default(),
                amount: amount.to_string(),
                fee: fee.to_string(),
                note: tx.input.clone(),
                block: parse_quantity(block_number)?,
                nonce: parse_quantity(&tx.nonce)?,
                gas_price: gas_price.to_string(),
                gas_used: gas_used.to_string(),
                result: receipt.succeeded(),
            },
        )
        .await?;

        transaction::upsert_receipt(
            &self.pool,
            &NewReceipt {
                transaction_id: stored_tx.transaction_id.clone(),
                currency_id: self.native.currency_id.clone(),
                contract_address: receipt.contract_address.clone(),
                cumulative_gas_used: parse_quantity(&receipt.cumulative_gas_used)?,
                gas_used: gas_used.to_string(),
                logs: serde_json::to_string(&receipt.logs)?,
                logs_bloom: receipt.logs_bloom.clone(),
                status: receipt.status.as_deref().map(parse_quantity).transpose()?.unwrap_or(0),
            },
        )
        .await?;

        self.events.parse_receipt_topic(receipt, &stored_tx).await?;

        // contract creations have no `to`; the created contract stands in for it
        let to = tx
            .to
            .as_deref()
            .or(receipt.contract_address.as_deref())
            .unwrap_or_default();
        self.projector.record_transaction(&stored_tx, to).await?;

        Ok(())
    }
}
