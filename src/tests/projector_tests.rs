//! tests/projector_tests.rs - join rows and balance projection for owned and foreign addresses

use super::{test_pool, CHAIN_ID, FOREIGN_ADDRESS, OWNED_ADDRESS};
use crate::{
    blockchain::projector::LedgerProjector,
    config::BalanceMode,
    db::{
        account::{self, AddressLink},
        token::{self, NewTokenTransaction},
    },
    models::{TokenTransaction, SENTINEL_ACCOUNT_ID},
};
use alloy_primitives::U256;
use sqlx::SqlitePool;

const TOKEN_ID: &str = "token-currency";
const THIRD_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

async fn transfer(pool: &SqlitePool, transaction_id: &str, from: &str, to: &str, amount: u64) -> TokenTransaction {
    token::upsert_token_transaction(
        pool,
        &NewTokenTransaction {
            transaction_id: transaction_id.to_string(),
            currency_id: TOKEN_ID.to_string(),
            txid: format!("0x{}", transaction_id),
            timestamp: 1_700_000_000,
            source_addresses: from.to_string(),
            destination_addresses: to.to_string(),
            amount: amount.to_string(),
            result: true,
        },
    )
    .await
    .unwrap()
}

async fn balance(pool: &SqlitePool, account_id: &str) -> Option<String> {
    account::get_account_currency(pool, account_id, TOKEN_ID)
        .await
        .unwrap()
        .map(|row| row.balance)
}

async fn owned_account(pool: &SqlitePool) -> String {
    account_with(pool, OWNED_ADDRESS).await
}

async fn account_with(pool: &SqlitePool, address: &str) -> String {
    let account_id = account::create_account(pool, CHAIN_ID).await.unwrap();
    account::add_account_address(pool, &account_id, address).await.unwrap();
    account_id
}

#[tokio::test]
async fn test_participant_lookup_ignores_case() {
    let pool = test_pool().await;
    let account_id = owned_account(&pool).await;
    let projector = LedgerProjector::new(pool, CHAIN_ID, BalanceMode::Overwrite);

    let owned = projector.participant(&OWNED_ADDRESS.to_lowercase()).await.unwrap();
    assert!(owned.is_registered());
    assert_eq!(owned.account_id, account_id);

    let foreign = projector.participant(FOREIGN_ADDRESS).await.unwrap();
    assert!(!foreign.is_registered());
    assert_eq!(foreign.account_address_id, SENTINEL_ACCOUNT_ID);
}

#[tokio::test]
async fn test_address_on_other_chain_is_unregistered() {
    let pool = test_pool().await;
    owned_account(&pool).await;
    let projector = LedgerProjector::new(pool, "80000001", BalanceMode::Overwrite);

    assert!(!projector.participant(OWNED_ADDRESS).await.unwrap().is_registered());
}

#[tokio::test]
async fn test_overwrite_mode_keeps_latest_amount() {
    let pool = test_pool().await;
    let account_id = owned_account(&pool).await;
    let projector = LedgerProjector::new(pool.clone(), CHAIN_ID, BalanceMode::Overwrite);

    let incoming = transfer(&pool, "t1", FOREIGN_ADDRESS, OWNED_ADDRESS, 100).await;
    projector.record_token_transfer(&incoming, U256::from(100u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("100"));

    let outgoing = transfer(&pool, "t2", OWNED_ADDRESS, FOREIGN_ADDRESS, 30).await;
    projector.record_token_transfer(&outgoing, U256::from(30u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("30"));
    assert_eq!(balance(&pool, SENTINEL_ACCOUNT_ID).await.as_deref(), Some("30"));
}

#[tokio::test]
async fn test_accumulate_mode_applies_each_transfer_once() {
    let pool = test_pool().await;
    let account_id = owned_account(&pool).await;
    let projector = LedgerProjector::new(pool.clone(), CHAIN_ID, BalanceMode::Accumulate);

    let incoming = transfer(&pool, "t1", FOREIGN_ADDRESS, OWNED_ADDRESS, 100).await;
    projector.record_token_transfer(&incoming, U256::from(100u64), 0).await.unwrap();
    // Replayed block
    projector.record_token_transfer(&incoming, U256::from(100u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("100"));

    let outgoing = transfer(&pool, "t2", OWNED_ADDRESS, FOREIGN_ADDRESS, 30).await;
    projector.record_token_transfer(&outgoing, U256::from(30u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("70"));

    // The sentinel never goes below zero
    assert_eq!(balance(&pool, SENTINEL_ACCOUNT_ID).await.as_deref(), Some("30"));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM address_token_transactions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 4);
}

#[tokio::test]
async fn test_accumulate_applies_every_log_of_one_transaction() {
    let pool = test_pool().await;
    let owned = owned_account(&pool).await;
    let third = account_with(&pool, THIRD_ADDRESS).await;
    let projector = LedgerProjector::new(pool.clone(), CHAIN_ID, BalanceMode::Accumulate);

    // Two transfers of the same token in one transaction share the token transaction row
    let first = transfer(&pool, "t1", FOREIGN_ADDRESS, OWNED_ADDRESS, 100).await;
    projector.record_token_transfer(&first, U256::from(100u64), 0).await.unwrap();
    let second = transfer(&pool, "t1", OWNED_ADDRESS, THIRD_ADDRESS, 40).await;
    assert_eq!(second.token_transaction_id, first.token_transaction_id);
    projector.record_token_transfer(&second, U256::from(40u64), 1).await.unwrap();

    assert_eq!(balance(&pool, &owned).await.as_deref(), Some("60"));
    assert_eq!(balance(&pool, &third).await.as_deref(), Some("40"));

    // Replaying both logs changes nothing
    projector.record_token_transfer(&first, U256::from(100u64), 0).await.unwrap();
    projector.record_token_transfer(&second, U256::from(40u64), 1).await.unwrap();
    assert_eq!(balance(&pool, &owned).await.as_deref(), Some("60"));
    assert_eq!(balance(&pool, &third).await.as_deref(), Some("40"));
}

#[tokio::test]
async fn test_accumulate_applies_after_interrupted_attempt() {
    let pool = test_pool().await;
    let account_id = owned_account(&pool).await;
    let projector = LedgerProjector::new(pool.clone(), CHAIN_ID, BalanceMode::Accumulate);
    let incoming = transfer(&pool, "t1", FOREIGN_ADDRESS, OWNED_ADDRESS, 100).await;

    // Join row left behind by an earlier attempt that never reached the balance
    let owned_address = projector.participant(OWNED_ADDRESS).await.unwrap();
    account::upsert_address_token_transaction(
        &pool,
        &incoming.token_transaction_id,
        &AddressLink {
            currency_id: TOKEN_ID,
            account_address_id: &owned_address.account_address_id,
            amount: "100",
            direction: 1,
            address: OWNED_ADDRESS,
        },
    )
    .await
    .unwrap();
    assert_eq!(balance(&pool, &account_id).await, None);

    projector.record_token_transfer(&incoming, U256::from(100u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("100"));

    projector.record_token_transfer(&incoming, U256::from(100u64), 0).await.unwrap();
    assert_eq!(balance(&pool, &account_id).await.as_deref(), Some("100"));
}
