use crate::blockchain::abi::{address_from_topic, amount_from_data, is_transfer_topic, AbiError};
use crate::blockchain::models::{LogPayload, ReceiptPayload};
use crate::blockchain::projector::LedgerProjector;
use crate::blockchain::registry::CurrencyRegistry;
use crate::db::token::{self, NewTokenTransaction};
use crate::error::SyncError;
use crate::models::Transaction;
use alloy_primitives::U256;
use sqlx::SqlitePool;
use tracing::debug;

const SERVICE: &str = "event_parser";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLog {
    pub contract: String,
    pub from: String,
    pub to: String,
    pub amount: U256,
}

/// Decode a log as an ERC-20 `Transfer`.
///
/// `Ok(None)` for logs of any other event, and for transfer-signature logs that are not shaped
/// `[signature, from, to]`. ERC-721 transfers index the token id as a fourth topic and are skipped.
pub fn decode_transfer(log: &LogPayload) -> Result<Option<TransferLog>, AbiError> {
    match log.topics.first() {
        Some(topic) if is_transfer_topic(topic) => {}
        _ => return Ok(None),
    }
    if log.topics.len() != 3 {
        return Ok(None);
    }

    Ok(Some(TransferLog {
        contract: log.address.to_lowercase(),
        from: address_from_topic(&log.topics[1])?,
        to: address_from_topic(&log.topics[2])?,
        amount: amount_from_data(&log.data)?,
    }))
}

#[derive(Clone)]
pub struct ReceiptEventParser {
    pool: SqlitePool,
    registry: CurrencyRegistry,
    projector: LedgerProjector,
}

impl ReceiptEventParser {
    pub fn new(pool: SqlitePool, registry: CurrencyRegistry, projector: LedgerProjector) -> Self {
        Self {
            pool,
            registry,
            projector,
        }
    }

    /// Record every token transfer in `receipt`. Returns how many were found.
    pub async fn parse_receipt_topic(
        &self,
        receipt: &ReceiptPayload,
        transaction: &Transaction,
    ) -> Result<usize, SyncError> {
        let mut transfers = 0;

        for (log_index, log) in receipt.logs.iter().enumerate() {
            let Some(transfer) = decode_transfer(log)? else {
                continue;
            };

            let currency = self.registry.resolve(&transfer.contract).await?;

            let token_tx = token::upsert_token_transaction(
                &self.pool,
                &NewTokenTransaction {
                    transaction_id: transaction.transaction_id.clone(),
                    currency_id: currency.currency_id.clone(),
                    txid: transaction.txid.clone(),
                    timestamp: transaction.timestamp,
                    source_addresses: transfer.from.clone(),
                    destination_addresses: transfer.to.clone(),
                    amount: transfer.amount.to_string(),
                    result: receipt.succeeded(),
                },
            )
            .await?;

            self.projector
                .record_token_transfer(&token_tx, transfer.amount, log_index as i64)
                .await?;

            debug!(
                service = SERVICE,
                txid = %transaction.txid,
                symbol = %currency.symbol,
                from = %transfer.from,
                to = %transfer.to,
                amount = %transfer.amount,
                "token transfer recorded"
            );
            transfers += 1;
        }

        Ok(transfers)
    }
}
