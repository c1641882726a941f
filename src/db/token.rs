use crate::models::TokenTransaction;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewTokenTransaction {
    pub transaction_id: String,
    pub currency_id: String,
    pub txid: String,
    pub timestamp: i64,
    pub source_addresses: String,
    pub destination_addresses: String,
    pub amount: String,
    pub result: bool,
}

/// One row per `(currency_id, transaction_id)`; a later transfer of the same token in the
/// same transaction overwrites the earlier one.
pub async fn upsert_token_transaction(
    pool: &Pool<Sqlite>,
    token_tx: &NewTokenTransaction,
) -> Result<TokenTransaction, sqlx::Error> {
    sqlx::query_as::<_, TokenTransaction>(
        r#"
        INSERT INTO token_transactions
        (token_transaction_id, transaction_id, currency_id, txid, timestamp,
         source_addresses, destination_addresses, amount, result)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(currency_id, transaction_id) DO UPDATE SET
            txid = excluded.txid,
            timestamp = excluded.timestamp,
            source_addresses = excluded.source_addresses,
            destination_addresses = excluded.destination_addresses,
            amount = excluded.amount,
            result = excluded.result
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&token_tx.transaction_id)
    .bind(&token_tx.currency_id)
    .bind(&token_tx.txid)
    .bind(token_tx.timestamp)
    .bind(&token_tx.source_addresses)
    .bind(&token_tx.destination_addresses)
    .bind(&token_tx.amount)
    .bind(token_tx.result)
    .fetch_one(pool)
    .await
}
