use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `eth_getBlockByNumber` result with full transaction objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    pub number: String,
    pub hash: String,
    pub timestamp: String,
    #[serde(default)]
    pub miner: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub transactions_root: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub extra_data: Option<String>,
    #[serde(default)]
    pub uncles: Vec<String>,
    #[serde(default)]
    pub transactions: Vec<TransactionPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "zero_quantity")]
    pub value: String,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default = "zero_quantity")]
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default = "zero_quantity")]
    pub cumulative_gas_used: String,
    #[serde(default = "zero_quantity")]
    pub gas_used: String,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogPayload>,
    #[serde(default)]
    pub logs_bloom: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ReceiptPayload {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }
}

/// A receipt log. Fields the parser does not read are kept in `extra` so the log can be
/// stored as the peer sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPayload {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn zero_quantity() -> String {
    "0x0".to_string()
}
