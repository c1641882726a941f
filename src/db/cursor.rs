use sqlx::{Pool, Sqlite};

pub async fn get_cursor(pool: &Pool<Sqlite>, blockchain_id: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT block FROM chain_cursors WHERE blockchain_id = ?")
        .bind(blockchain_id)
        .fetch_optional(pool)
        .await
}

/// Move the cursor forward to `block`. A lower value never rewinds it.
pub async fn advance_cursor(pool: &Pool<Sqlite>, blockchain_id: &str, block: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO chain_cursors (blockchain_id, block) VALUES (?, ?)
        ON CONFLICT(blockchain_id) DO UPDATE SET block = MAX(block, excluded.block)
        RETURNING block
        "#,
    )
    .bind(blockchain_id)
    .bind(block)
    .fetch_one(pool)
    .await
}
