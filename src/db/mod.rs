pub mod account;
pub mod block;
pub mod connection;
pub mod currency;
pub mod cursor;
pub mod lease;
pub mod migration;
pub mod token;
pub mod transaction;

pub const INIT_SCHEMA: &str = r#"
-- Highest block known to exist on each chain, advanced by the head watcher
CREATE TABLE IF NOT EXISTS chain_cursors (
    blockchain_id TEXT PRIMARY KEY,
    block INTEGER NOT NULL
);

-- Lease queue, one row per block to synchronize
CREATE TABLE IF NOT EXISTS sync_tasks (
    blockchain_id TEXT NOT NULL,
    block_number INTEGER NOT NULL,
    done BOOLEAN NOT NULL DEFAULT 0,
    lease_started_at INTEGER NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (blockchain_id, block_number)
);

CREATE TABLE IF NOT EXISTS blocks (
    block_id TEXT PRIMARY KEY,
    blockchain_id TEXT NOT NULL,
    block INTEGER NOT NULL,
    block_hash TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    result TEXT NOT NULL,
    transaction_count INTEGER NOT NULL,
    miner TEXT,
    difficulty TEXT,
    transactions_root TEXT,
    size INTEGER,
    gas_used INTEGER,
    extra_data TEXT,
    uncles TEXT NOT NULL,
    UNIQUE (blockchain_id, block)
);

CREATE TABLE IF NOT EXISTS currencies (
    currency_id TEXT PRIMARY KEY,
    blockchain_id TEXT NOT NULL,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    currency_type INTEGER NOT NULL,
    publish BOOLEAN NOT NULL DEFAULT 0,
    decimals INTEGER NOT NULL,
    total_supply TEXT,
    contract TEXT,
    icon TEXT,
    UNIQUE (blockchain_id, contract)
);

CREATE TABLE IF NOT EXISTS transactions (
    transaction_id TEXT PRIMARY KEY,
    currency_id TEXT NOT NULL,
    txid TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    source_addresses TEXT NOT NULL,
    destination_addresses TEXT NOT NULL,
    amount TEXT NOT NULL,
    fee TEXT NOT NULL,
    note TEXT NOT NULL,
    block INTEGER NOT NULL,
    nonce INTEGER NOT NULL,
    gas_price TEXT NOT NULL,
    gas_used TEXT NOT NULL,
    result BOOLEAN NOT NULL,
    UNIQUE (currency_id, txid)
);

CREATE TABLE IF NOT EXISTS receipts (
    receipt_id TEXT PRIMARY KEY,
    transaction_id TEXT NOT NULL,
    currency_id TEXT NOT NULL,
    contract_address TEXT,
    cumulative_gas_used INTEGER NOT NULL,
    gas_used TEXT NOT NULL,
    logs TEXT NOT NULL,
    logs_bloom TEXT NOT NULL,
    status INTEGER NOT NULL,
    UNIQUE (currency_id, transaction_id)
);

CREATE TABLE IF NOT EXISTS token_transactions (
    token_transaction_id TEXT PRIMARY KEY,
    transaction_id TEXT NOT NULL,
    currency_id TEXT NOT NULL,
    txid TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    source_addresses TEXT NOT NULL,
    destination_addresses TEXT NOT NULL,
    amount TEXT NOT NULL,
    result BOOLEAN NOT NULL,
    UNIQUE (currency_id, transaction_id)
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id TEXT PRIMARY KEY,
    blockchain_id TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS account_addresses (
    account_address_id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    address TEXT NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(account_id)
);

CREATE TABLE IF NOT EXISTS account_currencies (
    account_currency_id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    currency_id TEXT NOT NULL,
    balance TEXT NOT NULL,
    number_of_external_key INTEGER NOT NULL DEFAULT 0,
    number_of_internal_key INTEGER NOT NULL DEFAULT 0,
    UNIQUE (account_id, currency_id, number_of_external_key, number_of_internal_key)
);

CREATE TABLE IF NOT EXISTS address_transactions (
    address_transaction_id TEXT PRIMARY KEY,
    currency_id TEXT NOT NULL,
    account_address_id TEXT NOT NULL,
    transaction_id TEXT NOT NULL,
    amount TEXT NOT NULL,
    direction INTEGER NOT NULL,
    address TEXT NOT NULL,
    UNIQUE (transaction_id, direction)
);

CREATE TABLE IF NOT EXISTS address_token_transactions (
    address_token_transaction_id TEXT PRIMARY KEY,
    currency_id TEXT NOT NULL,
    account_address_id TEXT NOT NULL,
    token_transaction_id TEXT NOT NULL,
    amount TEXT NOT NULL,
    direction INTEGER NOT NULL,
    address TEXT NOT NULL,
    UNIQUE (token_transaction_id, direction)
);

-- One row per (transfer log, side) whose amount has been added to a running balance
CREATE TABLE IF NOT EXISTS applied_token_transfers (
    token_transaction_id TEXT NOT NULL,
    log_index INTEGER NOT NULL,
    direction INTEGER NOT NULL,
    PRIMARY KEY (token_transaction_id, log_index, direction)
);

-- Create indexes for efficient querying
CREATE INDEX IF NOT EXISTS idx_sync_tasks_claimable ON sync_tasks(blockchain_id, done, retry_count, lease_started_at);
CREATE INDEX IF NOT EXISTS idx_account_addresses_address ON account_addresses(address);
CREATE INDEX IF NOT EXISTS idx_currencies_native ON currencies(blockchain_id, currency_type);
"#;
