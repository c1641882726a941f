// Transactions and their receipts, both keyed by natural identity so a retried block
// updates the rows it already wrote.

use crate::models::{Receipt, Transaction};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub currency_id: String,
    pub txid: String,
    pub timestamp: i64,
    pub source_addresses: String,
    pub destination_addresses: String,
    pub amount: String,
    pub fee: String,
    pub note: String,
    pub block: i64,
    pub nonce: i64,
    pub gas_price: String,
    pub gas_used: String,
    pub result: bool,
}

#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub transaction_id: String,
    pub currency_id: String,
    pub contract_address: Option<String>,
    pub cumulative_gas_used: i64,
    pub gas_used: String,
    pub logs: String,
    pub logs_bloom: String,
    pub status: i64,
}

pub async fn upsert_transaction(pool: &Pool<Sqlite>, tx: &NewTransaction) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions
        (transaction_id, currency_id, txid, timestamp, source_addresses, destination_addresses,
         amount, fee, note, block, nonce, gas_price, gas_used, result)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(currency_id, txid) DO UPDATE SET
            timestamp = excluded.timestamp,
            source_addresses = excluded.source_addresses,
            destination_addresses = excluded.destination_addresses,
            amount = excluded.amount,
            fee = excluded.fee,
            note = excluded.note,
            block = excluded.block,
            nonce = excluded.nonce,
            gas_price = excluded.gas_price,
            gas_used = excluded.gas_used,
            result = excluded.result
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&tx.currency_id)
    .bind(&tx.txid)
    .bind(tx.timestamp)
    .bind(&tx.source_addresses)
    .bind(&tx.destination_addresses)
    .bind(&tx.amount)
    .bind(&tx.fee)
    .bind(&tx.note)
    .bind(tx.block)
    .bind(tx.nonce)
    .bind(&tx.gas_price)
    .bind(&tx.gas_used)
    .bind(tx.result)
    .fetch_one(pool)
    .await
}

pub async fn upsert_receipt(pool: &Pool<Sqlite>, receipt: &NewReceipt) -> Result<Receipt, sqlx::Error> {
    sqlx::query_as::<_, Receipt>(
        r#"
        INSERT INTO receipts
        (receipt_id, transaction_id, currency_id, contract_address, cumulative_gas_used,
         gas_used, logs, logs_bloom, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(currency_id, transaction_id) DO UPDATE SET
            contract_address = excluded.contract_address,
            cumulative_gas_used = excluded.cumulative_gas_used,
            gas_used = excluded.gas_used,
            logs = excluded.logs,
            logs_bloom = excluded.logs_bloom,
            status = excluded.status
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&receipt.transaction_id)
    .bind(&receipt.currency_id)
    .bind(&receipt.contract_address)
    .bind(receipt.cumulative_gas_used)
    .bind(&receipt.gas_used)
    .bind(&receipt.logs)
    .bind(&receipt.logs_bloom)
    .bind(receipt.status)
    .fetch_one(pool)
    .await
}

pub async fn get_transaction(
    pool: &Pool<Sqlite>,
    currency_id: &str,
    txid: &str,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE currency_id = ? AND txid = ?")
        .bind(currency_id)
        .bind(txid)
        .fetch_optional(pool)
        .await
}
