// Wallet-owned accounts and the join/balance rows projected onto them.

use crate::models::{
    AccountAddress, AccountCurrency, AddressTokenTransaction, AddressTransaction,
};
use sqlx::{Executor, Pool, Sqlite};
use uuid::Uuid;

pub async fn create_account(pool: &Pool<Sqlite>, blockchain_id: &str) -> Result<String, sqlx::Error> {
    let account_id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO accounts (account_id, blockchain_id) VALUES (?, ?)")
        .bind(&account_id)
        .bind(blockchain_id)
        .execute(pool)
        .await?;
    Ok(account_id)
}

pub async fn add_account_address(
    pool: &Pool<Sqlite>,
    account_id: &str,
    address: &str,
) -> Result<AccountAddress, sqlx::Error> {
    sqlx::query_as::<_, AccountAddress>(
        "INSERT INTO account_addresses (account_address_id, account_id, address) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id)
    .bind(address)
    .fetch_one(pool)
    .await
}

/// Address owned by an account on `blockchain_id`, compared case-insensitively.
pub async fn find_registered_address(
    pool: &Pool<Sqlite>,
    blockchain_id: &str,
    address: &str,
) -> Result<Option<AccountAddress>, sqlx::Error> {
    sqlx::query_as::<_, AccountAddress>(
        r#"
        SELECT aa.account_address_id, aa.account_id, aa.address
        FROM account_addresses aa
        JOIN accounts a ON a.account_id = aa.account_id
        WHERE a.blockchain_id = ? AND lower(aa.address) = lower(?)
        LIMIT 1
        "#,
    )
    .bind(blockchain_id)
    .bind(address)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Clone)]
pub struct AddressLink<'a> {
    pub currency_id: &'a str,
    pub account_address_id: &'a str,
    pub amount: &'a str,
    pub direction: i64,
    pub address: &'a str,
}

pub async fn upsert_address_transaction(
    pool: &Pool<Sqlite>,
    transaction_id: &str,
    link: &AddressLink<'_>,
) -> Result<AddressTransaction, sqlx::Error> {
    sqlx::query_as::<_, AddressTransaction>(
        r#"
        INSERT INTO address_transactions
        (address_transaction_id, currency_id, account_address_id, transaction_id, amount, direction, address)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(transaction_id, direction) DO UPDATE SET
            currency_id = excluded.currency_id,
            account_address_id = excluded.account_address_id,
            amount = excluded.amount,
            address = excluded.address
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(link.currency_id)
    .bind(link.account_address_id)
    .bind(transaction_id)
    .bind(link.amount)
    .bind(link.direction)
    .bind(link.address)
    .fetch_one(pool)
    .await
}

/// Upsert the join row for one side of a token transfer.
pub async fn upsert_address_token_transaction<'c, E>(
    executor: E,
    token_transaction_id: &str,
    link: &AddressLink<'_>,
) -> Result<AddressTokenTransaction, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, AddressTokenTransaction>(
        r#"
        INSERT INTO address_token_transactions
        (address_token_transaction_id, currency_id, account_address_id, token_transaction_id, amount, direction, address)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(token_transaction_id, direction) DO UPDATE SET
            currency_id = excluded.currency_id,
            account_address_id = excluded.account_address_id,
            amount = excluded.amount,
            address = excluded.address
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(link.currency_id)
    .bind(link.account_address_id)
    .bind(token_transaction_id)
    .bind(link.amount)
    .bind(link.direction)
    .bind(link.address)
    .fetch_one(executor)
    .await
}

/// Record that one side of a transfer log has been applied to a running balance.
///
/// Returns `false` when it already was.
pub async fn mark_transfer_applied<'c, E>(
    executor: E,
    token_transaction_id: &str,
    log_index: i64,
    direction: i64,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO applied_token_transfers (token_transaction_id, log_index, direction)
        VALUES (?, ?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(token_transaction_id)
    .bind(log_index)
    .bind(direction)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_account_currency<'c, E>(
    executor: E,
    account_id: &str,
    currency_id: &str,
) -> Result<Option<AccountCurrency>, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, AccountCurrency>(
        r#"
        SELECT * FROM account_currencies
        WHERE account_id = ? AND currency_id = ?
          AND number_of_external_key = 0 AND number_of_internal_key = 0
        "#,
    )
    .bind(account_id)
    .bind(currency_id)
    .fetch_optional(executor)
    .await
}

/// Set the balance of the `(account, currency, 0, 0)` row, creating it if needed.
pub async fn set_account_balance<'c, E>(
    executor: E,
    account_id: &str,
    currency_id: &str,
    balance: &str,
) -> Result<AccountCurrency, sqlx::Error>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, AccountCurrency>(
        r#"
        INSERT INTO account_currencies
        (account_currency_id, account_id, currency_id, balance, number_of_external_key, number_of_internal_key)
        VALUES (?, ?, ?, ?, 0, 0)
        ON CONFLICT(account_id, currency_id, number_of_external_key, number_of_internal_key)
        DO UPDATE SET balance = excluded.balance
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id)
    .bind(currency_id)
    .bind(balance)
    .fetch_one(executor)
    .await
}
