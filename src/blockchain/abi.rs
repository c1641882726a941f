//! ABI helpers for the ERC-20 surface the sync engine touches: the four metadata accessors,
//! the `Transfer` event, and the hex quantities JSON-RPC uses for numbers.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use std::str::FromStr;
use thiserror::Error;

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);

    function name() external view returns (string);
    function symbol() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
}

/// Hex length of a `string` return holding one 32-byte word of data: `0x` + offset + length + data.
pub const STRING_RETURN_LEN: usize = 2 + 64 * 3;

#[derive(Error, Debug)]
pub enum AbiError {
    #[error("Empty return data")]
    Empty,

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Value does not fit: {0}")]
    OutOfRange(String),

    #[error("ABI decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAccessor {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
}

impl TokenAccessor {
    pub fn selector(self) -> [u8; 4] {
        match self {
            TokenAccessor::Name => nameCall::SELECTOR,
            TokenAccessor::Symbol => symbolCall::SELECTOR,
            TokenAccessor::Decimals => decimalsCall::SELECTOR,
            TokenAccessor::TotalSupply => totalSupplyCall::SELECTOR,
        }
    }

    /// `0x`-prefixed call data for `eth_call`.
    pub fn calldata(self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }

    pub fn field(self) -> &'static str {
        match self {
            TokenAccessor::Name => "name",
            TokenAccessor::Symbol => "symbol",
            TokenAccessor::Decimals => "decimals",
            TokenAccessor::TotalSupply => "totalSupply",
        }
    }
}

fn strip_hex(raw: &str) -> &str {
    raw.strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw)
}

/// Decode a `string` return value.
///
/// Anything that is not exactly [`STRING_RETURN_LEN`] characters long is returned as-is;
/// some tokens answer `name()`/`symbol()` with a raw `bytes32` instead.
pub fn decode_string(raw: &str) -> Result<String, AbiError> {
    if raw.len() != STRING_RETURN_LEN {
        return Ok(raw.to_string());
    }

    let bytes = hex::decode(strip_hex(raw)).map_err(|e| AbiError::InvalidHex(e.to_string()))?;
    nameCall::abi_decode_returns(&bytes, false)
        .map(|ret| ret._0)
        .map_err(|e| AbiError::Decode(e.to_string()))
}

/// Parse a base-16 integer, with or without the `0x` prefix.
pub fn parse_u256(raw: &str) -> Result<U256, AbiError> {
    let digits = strip_hex(raw);
    if digits.is_empty() {
        return Err(AbiError::Empty);
    }
    U256::from_str_radix(digits, 16).map_err(|e| AbiError::InvalidHex(format!("{}: {}", raw, e)))
}

/// Parse a JSON-RPC quantity into a storage integer.
pub fn parse_quantity(raw: &str) -> Result<i64, AbiError> {
    let value = parse_u256(raw)?;
    if value > U256::from(i64::MAX as u64) {
        return Err(AbiError::OutOfRange(raw.to_string()));
    }
    Ok(value.as_limbs()[0] as i64)
}

pub fn decode_decimals(raw: &str) -> Result<u8, AbiError> {
    let value = parse_u256(raw)?;
    if value > U256::from(u8::MAX) {
        return Err(AbiError::OutOfRange(format!("decimals {}", value)));
    }
    Ok(value.as_limbs()[0] as u8)
}

/// Low 20 bytes of a 32-byte topic, as a lowercase `0x` address.
pub fn address_from_topic(topic: &str) -> Result<String, AbiError> {
    let word = B256::from_str(topic).map_err(|e| AbiError::InvalidHex(format!("{}: {}", topic, e)))?;
    let address = Address::from_word(word);
    Ok(format!("0x{}", hex::encode(address.as_slice())))
}

/// Amount carried in a transfer log's `data`. `0x` means zero; only the first word is read.
pub fn amount_from_data(data: &str) -> Result<U256, AbiError> {
    let digits = strip_hex(data);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    let word = if digits.len() > 64 { &digits[..64] } else { digits };
    parse_u256(word)
}

pub fn transfer_topic() -> B256 {
    Transfer::SIGNATURE_HASH
}

pub fn is_transfer_topic(topic: &str) -> bool {
    B256::from_str(topic)
        .map(|t| t == Transfer::SIGNATURE_HASH)
        .unwrap_or(false)
}
