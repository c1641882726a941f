use crate::models::{Currency, CurrencyType};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewTokenCurrency {
    pub blockchain_id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i64,
    pub total_supply: String,
    pub contract: String,
    pub icon: String,
}

pub async fn find_by_contract(
    pool: &Pool<Sqlite>,
    blockchain_id: &str,
    contract: &str,
) -> Result<Option<Currency>, sqlx::Error> {
    sqlx::query_as::<_, Currency>("SELECT * FROM currencies WHERE blockchain_id = ? AND contract = ?")
        .bind(blockchain_id)
        .bind(contract)
        .fetch_optional(pool)
        .await
}

/// Insert a token currency unless another writer got there first, then read back the stored row.
pub async fn find_or_create_token(pool: &Pool<Sqlite>, token: &NewTokenCurrency) -> Result<Currency, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO currencies
        (currency_id, blockchain_id, name, symbol, currency_type, publish, decimals, total_supply, contract, icon)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
        ON CONFLICT(blockchain_id, contract) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&token.blockchain_id)
    .bind(&token.name)
    .bind(&token.symbol)
    .bind(CurrencyType::Token.as_i64())
    .bind(token.decimals)
    .bind(&token.total_supply)
    .bind(&token.contract)
    .bind(&token.icon)
    .execute(pool)
    .await?;

    find_by_contract(pool, &token.blockchain_id, &token.contract)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_native(pool: &Pool<Sqlite>, blockchain_id: &str) -> Result<Option<Currency>, sqlx::Error> {
    sqlx::query_as::<_, Currency>(
        "SELECT * FROM currencies WHERE blockchain_id = ? AND currency_type = ? LIMIT 1",
    )
    .bind(blockchain_id)
    .bind(CurrencyType::Native.as_i64())
    .fetch_optional(pool)
    .await
}

pub async fn ensure_native(
    pool: &Pool<Sqlite>,
    blockchain_id: &str,
    name: &str,
    symbol: &str,
    decimals: i64,
) -> Result<Currency, sqlx::Error> {
    if let Some(native) = find_native(pool, blockchain_id).await? {
        return Ok(native);
    }

    sqlx::query_as::<_, Currency>(
        r#"
        INSERT INTO currencies
        (currency_id, blockchain_id, name, symbol, currency_type, publish, decimals, total_supply, contract, icon)
        VALUES (?, ?, ?, ?, ?, 1, ?, NULL, NULL, NULL)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(blockchain_id)
    .bind(name)
    .bind(symbol)
    .bind(CurrencyType::Native.as_i64())
    .bind(decimals)
    .fetch_one(pool)
    .await
}
