//! Projects transactions and token transfers onto wallet-owned addresses.
//!
//! Addresses the wallet does not own resolve to the sentinel participant, whose account and
//! account-address ids are both [`SENTINEL_ACCOUNT_ID`]. It flows through exactly the same
//! upserts as a real account.

use crate::config::BalanceMode;
use crate::db::account::{self, AddressLink};
use crate::error::SyncError;
use crate::models::{Direction, TokenTransaction, Transaction, SENTINEL_ACCOUNT_ID};
use alloy_primitives::U256;
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::debug;

const SERVICE: &str = "projector";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub account_id: String,
    pub account_address_id: String,
    pub address: String,
}

impl Participant {
    pub fn unregistered(address: &str) -> Self {
        Self {
            account_id: SENTINEL_ACCOUNT_ID.to_string(),
            account_address_id: SENTINEL_ACCOUNT_ID.to_string(),
            address: address.to_string(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.account_id != SENTINEL_ACCOUNT_ID
    }
}

#[derive(Clone)]
pub struct LedgerProjector {
    pool: SqlitePool,
    blockchain_id: String,
    balance_mode: BalanceMode,
}

impl LedgerProjector {
    pub fn new(pool: SqlitePool, blockchain_id: impl Into<String>, balance_mode: BalanceMode) -> Self {
        Self {
            pool,
            blockchain_id: blockchain_id.into(),
            balance_mode,
        }
    }

    pub async fn participant(&self, address: &str) -> Result<Participant, SyncError> {
        let found = account::find_registered_address(&self.pool, &self.blockchain_id, address).await?;
        Ok(match found {
            Some(owned) => Participant {
                account_id: owned.account_id,
                account_address_id: owned.account_address_id,
                address: address.to_string(),
            },
            None => Participant::unregistered(address),
        })
    }

    /// One `address_transactions` row for the sender and one for the receiver.
    pub async fn record_transaction(&self, tx: &Transaction, to: &str) -> Result<(), SyncError> {
        let sides = [
            (tx.source_addresses.as_str(), Direction::Source),
            (to, Direction::Destination),
        ];

        for (address, direction) in sides {
            let participant = self.participant(address).await?;
            account::upsert_address_transaction(
                &self.pool,
                &tx.transaction_id,
                &AddressLink {
                    currency_id: &tx.currency_id,
                    account_address_id: &participant.account_address_id,
                    amount: &tx.amount,
                    direction: direction.as_i64(),
                    address,
                },
            )
            .await?;
            debug!(
                service = SERVICE,
                txid = %tx.txid,
                address,
                registered = participant.is_registered(),
                ?direction,
                "address transaction recorded"
            );
        }
        Ok(())
    }

    /// Join rows and balance rows for both sides of the transfer at `log_index` in its receipt.
    ///
    /// Both sides are written in one storage transaction. In accumulate mode each
    /// `(log, side)` is applied at most once, so a replayed block leaves balances untouched.
    pub async fn record_token_transfer(
        &self,
        token_tx: &TokenTransaction,
        amount: U256,
        log_index: i64,
    ) -> Result<(), SyncError> {
        let source = self.participant(&token_tx.source_addresses).await?;
        let destination = self.participant(&token_tx.destination_addresses).await?;

        let mut db_tx = self.pool.begin().await?;
        for (participant, direction) in [(&source, Direction::Source), (&destination, Direction::Destination)] {
            account::upsert_address_token_transaction(
                &mut *db_tx,
                &token_tx.token_transaction_id,
                &AddressLink {
                    currency_id: &token_tx.currency_id,
                    account_address_id: &participant.account_address_id,
                    amount: &token_tx.amount,
                    direction: direction.as_i64(),
                    address: &participant.address,
                },
            )
            .await?;

            self.project_balance(&mut *db_tx, token_tx, participant, amount, direction, log_index)
                .await?;
        }
        db_tx.commit().await?;
        Ok(())
    }

    async fn project_balance(
        &self,
        conn: &mut SqliteConnection,
        token_tx: &TokenTransaction,
        participant: &Participant,
        amount: U256,
        direction: Direction,
        log_index: i64,
    ) -> Result<(), SyncError> {
        let currency_id = token_tx.currency_id.as_str();
        let balance = match self.balance_mode {
            // Latest transfer amount, not a running total
            BalanceMode::Overwrite => amount,
            BalanceMode::Accumulate => {
                let fresh = account::mark_transfer_applied(
                    &mut *conn,
                    &token_tx.token_transaction_id,
                    log_index,
                    direction.as_i64(),
                )
                .await?;
                if !fresh {
                    debug!(service = SERVICE, txid = %token_tx.txid, log_index, ?direction, "transfer already applied");
                    return Ok(());
                }

                let current = account::get_account_currency(&mut *conn, &participant.account_id, currency_id)
                    .await?
                    .and_then(|row| U256::from_str(&row.balance).ok())
                    .unwrap_or(U256::ZERO);
                match direction {
                    Direction::Destination => current
                        .checked_add(amount)
                        .ok_or_else(|| SyncError::Overflow(format!("balance of {}", participant.account_id)))?,
                    Direction::Source => current.saturating_sub(amount),
                }
            }
        };

        account::set_account_balance(&mut *conn, &participant.account_id, currency_id, &balance.to_string())
            .await?;
        Ok(())
    }
}
