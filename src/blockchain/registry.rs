use crate::blockchain::abi::{decode_decimals, decode_string, parse_u256, TokenAccessor};
use crate::blockchain::client::EthClient;
use crate::blockchain::icon::IconResolver;
use crate::db::currency::{self, NewTokenCurrency};
use crate::error::SyncError;
use crate::models::Currency;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICE: &str = "registry";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
}

/// Resolves token contracts to currency rows, registering unseen contracts from on-chain
/// metadata.
#[derive(Clone)]
pub struct CurrencyRegistry {
    pool: SqlitePool,
    blockchain_id: String,
    client: Arc<EthClient>,
    icons: IconResolver,
    cache: Cache<String, Currency>,
}

impl CurrencyRegistry {
    pub fn new(
        pool: SqlitePool,
        blockchain_id: impl Into<String>,
        client: Arc<EthClient>,
        icons: IconResolver,
        cache_capacity: u64,
    ) -> Self {
        Self {
            pool,
            blockchain_id: blockchain_id.into(),
            client,
            icons,
            cache: Cache::builder().max_capacity(cache_capacity).build(),
        }
    }

    pub async fn resolve(&self, contract_address: &str) -> Result<Currency, SyncError> {
        let contract = contract_address.to_lowercase();

        if let Some(cached) = self.cache.get(&contract).await {
            return Ok(cached);
        }

        if let Some(existing) = currency::find_by_contract(&self.pool, &self.blockchain_id, &contract).await? {
            self.cache.insert(contract, existing.clone()).await;
            return Ok(existing);
        }

        debug!(service = SERVICE, chain_id = %self.blockchain_id, %contract, "unknown token, fetching metadata");
        let metadata = self.fetch_metadata(&contract).await?;
        let icon = self.icons.resolve(&metadata.symbol).await;

        let created = currency::find_or_create_token(
            &self.pool,
            &NewTokenCurrency {
                blockchain_id: self.blockchain_id.clone(),
                name: metadata.name,
                symbol: metadata.symbol,
                decimals: metadata.decimals as i64,
                total_supply: metadata.total_supply,
                contract: contract.clone(),
                icon,
            },
        )
        .await?;

        info!(
            service = SERVICE,
            chain_id = %self.blockchain_id,
            %contract,
            symbol = %created.symbol,
            currency_id = %created.currency_id,
            "registered token currency"
        );
        self.cache.insert(contract, created.clone()).await;
        Ok(created)
    }

    /// Query all four accessors at once. Any missing or unusable field fails the whole lookup.
    pub async fn fetch_metadata(&self, contract: &str) -> Result<TokenMetadata, SyncError> {
        let (name, symbol, decimals, total_supply) = futures::future::try_join4(
            self.call_accessor(contract, TokenAccessor::Name),
            self.call_accessor(contract, TokenAccessor::Symbol),
            self.call_accessor(contract, TokenAccessor::Decimals),
            self.call_accessor(contract, TokenAccessor::TotalSupply),
        )
        .await?;

        let name = decode_string(&name).map_err(|_| incomplete(contract, TokenAccessor::Name))?;
        if name.is_empty() {
            return Err(incomplete(contract, TokenAccessor::Name));
        }
        let symbol = decode_string(&symbol).map_err(|_| incomplete(contract, TokenAccessor::Symbol))?;
        if symbol.is_empty() {
            return Err(incomplete(contract, TokenAccessor::Symbol));
        }
        let decimals = decode_decimals(&decimals).map_err(|_| incomplete(contract, TokenAccessor::Decimals))?;
        let total_supply = parse_u256(&total_supply)
            .map_err(|_| incomplete(contract, TokenAccessor::TotalSupply))?
            .to_string();

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    /// Raw hex returned by one accessor. `null` and bare `0x` count as no value.
    async fn call_accessor(&self, contract: &str, accessor: TokenAccessor) -> Result<String, SyncError> {
        match self.client.call_contract(contract, &accessor.calldata()).await? {
            Some(raw) if raw != "0x" && !raw.is_empty() => Ok(raw),
            _ => Err(incomplete(contract, accessor)),
        }
    }
}

fn incomplete(contract: &str, accessor: TokenAccessor) -> SyncError {
    SyncError::IncompleteTokenMetadata {
        contract: contract.to_string(),
        field: accessor.field(),
    }
}
