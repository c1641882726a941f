// Row structs for every ledger table plus the small enums stored as integers.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reserved account id that collects activity from addresses the wallet does not own.
/// Used for both `account_id` and `account_address_id` columns.
pub const SENTINEL_ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Source = 0,
    Destination = 1,
}

impl Direction {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencyType {
    Native = 1,
    Token = 2,
}

impl CurrencyType {
    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyncTask {
    pub blockchain_id: String,
    pub block_number: i64,
    pub done: bool,
    pub lease_started_at: i64,
    pub retry_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Block {
    pub block_id: String,
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Currency {
    pub currency_id: String,
    pub blockchain_id: String,
    pub name: String,
    pub symbol: String,
    pub currency_type: i64,
    pub publish: bool,
    pub decimals: i64,
    pub total_supply: Option<String>,
    pub contract: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub transaction_id: String,
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Receipt {
    pub receipt_id: String,
    pub transaction_id: String,
    pub currency_id: String,
    pub contract_address: Option<String>,
    pub cumulative_gas_used: i64,
    pub gas_used: String,
    pub logs: String,
    pub logs_bloom: String,
    pub status: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenTransaction {
    pub token_transaction_id: String,
    pub transaction_id: String,
    pub currency_id: String,
    pub txid: String,
    pub timestamp: i64,
    pub source_addresses: String,
    pub destination_addresses: String,
    pub amount: String,
    pub result: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountAddress {
    pub account_address_id: String,
    pub account_id: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountCurrency {
    pub account_currency_id: String,
    pub account_id: String,
    pub currency_id: String,
    pub balance: String,
    pub number_of_external_key: i64,
    pub number_of_internal_key: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AddressTransaction {
    pub address_transaction_id: String,
    pub currency_id: String,
    pub account_address_id: String,
    pub transaction_id: String,
    pub amount: String,
    pub direction: i64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AddressTokenTransaction {
    pub address_token_transaction_id: String,
    pub currency_id: String,
    pub account_address_id: String,
    pub token_transaction_id: String,
    pub amount: String,
    pub direction: i64,
    pub address: String,
}
