use crate::models::Block;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewBlock {
    pub blockchain_id: String,
    pub block: i64,
    pub block_hash: String,
    pub timestamp: i64,
    pub result: String,
    pub transaction_count: i64,
    pub miner: Option<String>,
    pub difficulty: Option<String>,
    pub transactions_root: Option<String>,
    pub size: Option<i64>,
    pub gas_used: Option<i64>,
    pub extra_data: Option<String>,
    pub uncles: String,
}

/// Insert the block, or replace every field of the existing `(blockchain_id, block)` row.
pub async fn upsert_block(pool: &Pool<Sqlite>, block: &NewBlock) -> Result<Block, sqlx::Error> {
    sqlx::query_as::<_, Block>(
        r#"
        INSERT INTO blocks
        (block_id, blockchain_id, block, block_hash, timestamp, result, transaction_count,
         miner, difficulty, transactions_root, size, gas_used, extra_data, uncles)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(blockchain_id, block) DO UPDATE SET
            block_hash = excluded.block_hash,
            timestamp = excluded.timestamp,
            result = excluded.result,
            transaction_count = excluded.transaction_count,
            miner = excluded.miner,
            difficulty = excluded.difficulty,
            transactions_root = excluded.transactions_root,
            size = excluded.size,
            gas_used = excluded.gas_used,
            extra_data = excluded.extra_data,
            uncles = excluded.uncles
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&block.blockchain_id)
    .bind(block.block)
    .bind(&block.block_hash)
    .bind(block.timestamp)
    .bind(&block.result)
    .bind(block.transaction_count)
    .bind(&block.miner)
    .bind(&block.difficulty)
    .bind(&block.transactions_root)
    .bind(block.size)
    .bind(block.gas_used)
    .bind(&block.extra_data)
    .bind(&block.uncles)
    .fetch_one(pool)
    .await
}

pub async fn get_block(pool: &Pool<Sqlite>, blockchain_id: &str, block: i64) -> Result<Option<Block>, sqlx::Error> {
    sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE blockchain_id = ? AND block = ?")
        .bind(blockchain_id)
        .bind(block)
        .fetch_optional(pool)
        .await
}
