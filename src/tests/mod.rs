//! Shared fixtures: in-memory ledger, a scripted JSON-RPC peer and canned ERC-20 payloads.

mod api_tests;
mod projector_tests;
mod scheduler_tests;

use crate::{
    blockchain::{icon::IconResolver, EthClient, EthParser},
    config::SyncSettings,
    db::{connection, currency},
    models::Currency,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::{collections::HashMap, sync::Arc, time::Duration};
use wiremock::{matchers::method, Mock, MockServer, Request, Respond, ResponseTemplate};

pub const CHAIN_ID: &str = "8000003C";
pub const TOKEN_CONTRACT: &str = "0x000000000000000000000000000000000000cafe";
pub const OWNED_ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
pub const FOREIGN_ADDRESS: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";
pub const TRANSFER_SIG: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
pub const DEFAULT_ICON: &str = "http://127.0.0.1/icon/ERC20.png";

pub async fn test_pool() -> SqlitePool {
    connection::in_memory().await.expect("Failed to open in-memory database")
}

pub fn settings() -> SyncSettings {
    SyncSettings::new(CHAIN_ID)
}

pub async fn seed_native(pool: &SqlitePool) -> Currency {
    currency::ensure_native(pool, CHAIN_ID, "Ethereum", "ETH", 18)
        .await
        .expect("Failed to seed native currency")
}

/// ABI encoding of a short `string` return value.
pub fn abi_string(value: &str) -> String {
    let mut data = hex::encode(value.as_bytes());
    while data.len() % 64 != 0 {
        data.push('0');
    }
    format!("0x{:064x}{:064x}{}", 0x20, value.len(), data)
}

pub fn abi_word(value: u64) -> String {
    format!("0x{:064x}", value)
}

pub fn topic(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x").to_lowercase())
}

/// JSON-RPC peer answering from fixed tables. Echoes the request id unless `wrong_id` is set.
#[derive(Clone, Default)]
pub struct MockPeer {
    pub blocks: HashMap<i64, Value>,
    pub receipts: HashMap<String, Value>,
    pub calls: HashMap<(String, String), String>,
    pub head: Option<i64>,
    pub wrong_id: bool,
}

impl MockPeer {
    pub fn with_block(mut self, block: i64, payload: Value, receipt: Value) -> Self {
        self.blocks.insert(block, payload);
        self.with_receipt(receipt)
    }

    pub fn with_receipt(mut self, receipt: Value) -> Self {
        if let Some(txid) = receipt["transactionHash"].as_str().map(str::to_string) {
            self.receipts.insert(txid, receipt);
        }
        self
    }

    pub fn with_token(mut self, contract: &str, name: Option<&str>, symbol: Option<&str>, decimals: u64, supply: u64) -> Self {
        let contract = contract.to_lowercase();
        if let Some(name) = name {
            self.calls.insert((contract.clone(), "0x06fdde03".to_string()), abi_string(name));
        }
        if let Some(symbol) = symbol {
            self.calls.insert((contract.clone(), "0x95d89b41".to_string()), abi_string(symbol));
        }
        self.calls.insert((contract.clone(), "0x313ce567".to_string()), abi_word(decimals));
        self.calls.insert((contract, "0x18160ddd".to_string()), abi_word(supply));
        self
    }
}

impl Respond for MockPeer {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let params = &body["params"];

        let result = match body["method"].as_str().unwrap_or_default() {
            "eth_getBlockByNumber" => params[0]
                .as_str()
                .and_then(|q| i64::from_str_radix(q.trim_start_matches("0x"), 16).ok())
                .and_then(|n| self.blocks.get(&n).cloned())
                .unwrap_or(Value::Null),
            "eth_getTransactionReceipt" => params[0]
                .as_str()
                .and_then(|txid| self.receipts.get(txid).cloned())
                .unwrap_or(Value::Null),
            "eth_call" => {
                let to = params[0]["to"].as_str().unwrap_or_default().to_lowercase();
                let data = params[0]["data"].as_str().unwrap_or_default().to_string();
                json!(self.calls.get(&(to, data)).cloned().unwrap_or_else(|| "0x".to_string()))
            }
            "eth_blockNumber" => self.head.map(|h| json!(format!("0x{:x}", h))).unwrap_or(Value::Null),
            _ => {
                return ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "error": { "code": -32601, "message": "method not found" }
                }))
            }
        };

        let id = if self.wrong_id { json!("mismatch") } else { body["id"].clone() };
        ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
    }
}

pub async fn start_peer(peer: MockPeer) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(peer).mount(&server).await;
    server
}

pub fn client_for(server: &MockServer) -> Arc<EthClient> {
    Arc::new(EthClient::with_options(&server.uri(), Duration::from_secs(5), None).expect("Failed to build client"))
}

pub fn icons_for(base_url: &str) -> IconResolver {
    IconResolver::with_options(base_url, DEFAULT_ICON, Duration::from_millis(500)).expect("Failed to build icon client")
}

pub async fn build_parser(pool: &SqlitePool, peer: &MockServer, icon_base: &str, settings: SyncSettings) -> EthParser {
    seed_native(pool).await;
    EthParser::new(pool.clone(), client_for(peer), icons_for(icon_base), settings)
        .await
        .expect("Failed to build parser")
}

/// Block `number` holding one call to the token contract whose receipt carries a single
/// `Transfer(from, to, amount)`.
pub fn transfer_block(number: i64, txid: &str, from: &str, to: &str, amount: u64) -> (Value, Value) {
    let (block, mut receipts) = transfers_block(number, &[(txid, from, to, amount)]);
    (block, receipts.remove(0))
}

/// Block `number` with one token transfer call per entry, in the given order, and the
/// matching receipts.
pub fn transfers_block(number: i64, transfers: &[(&str, &str, &str, u64)]) -> (Value, Vec<Value>) {
    let quantity = format!("0x{:x}", number);
    let transactions: Vec<Value> = transfers
        .iter()
        .enumerate()
        .map(|(nonce, (txid, from, _, _))| {
            json!({
                "hash": txid,
                "from": from,
                "to": TOKEN_CONTRACT,
                "value": "0x0",
                "gasPrice": "0x3b9aca00",
                "input": "0xa9059cbb",
                "blockNumber": quantity,
                "nonce": format!("0x{:x}", nonce + 1)
            })
        })
        .collect();
    let block = json!({
        "number": quantity,
        "hash": format!("0x{:064x}", number),
        "timestamp": "0x5f5e100",
        "miner": "0x0000000000000000000000000000000000000000",
        "difficulty": "0x0",
        "transactionsRoot": format!("0x{:064x}", 1),
        "size": "0x220",
        "gasUsed": "0x5208",
        "extraData": "0x",
        "uncles": [],
        "transactions": transactions
    });
    let receipts = transfers
        .iter()
        .map(|(txid, from, to, amount)| {
            json!({
                "transactionHash": txid,
                "blockNumber": quantity,
                "contractAddress": null,
                "cumulativeGasUsed": "0x5208",
                "gasUsed": "0x5208",
                "logsBloom": "0x00",
                "status": "0x1",
                "logs": [{
                    "address": TOKEN_CONTRACT,
                    "topics": [TRANSFER_SIG, topic(from), topic(to)],
                    "data": abi_word(*amount),
                    "logIndex": "0x0",
                    "transactionHash": txid
                }]
            })
        })
        .collect();
    (block, receipts)
}
