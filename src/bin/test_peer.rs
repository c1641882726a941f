use evm_ledger_sync::{
    blockchain::{events::decode_transfer, icon::IconResolver, registry::CurrencyRegistry, EthClient},
    config::Config,
    db::connection,
};
use std::sync::Arc;
use tracing::{error, info, warn, Level};

// Manual check against the configured peer: reads the head, walks one block and
// fetches token metadata for the first transfer it finds. Nothing is written except
// the token currency row.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Config::from_env();
    let client = Arc::new(EthClient::new(&config)?);

    // 1. Head
    let head = client.block_number().await?;
    info!("✅ Peer head: {}", head);

    // 2. Block, from the first argument or the head
    let number = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<i64>().ok())
        .unwrap_or(head);
    let Some(block) = client.get_block_by_number(number).await? else {
        error!("❌ Peer has no block {}", number);
        return Ok(());
    };
    info!("✅ Block {} has {} transactions", number, block.transactions.len());

    // 3. First token transfer in the block
    for tx in &block.transactions {
        let Some(receipt) = client.get_transaction_receipt(&tx.hash).await? else {
            warn!("No receipt for {}", tx.hash);
            continue;
        };

        for log in &receipt.logs {
            let Ok(Some(transfer)) = decode_transfer(log) else {
                continue;
            };
            info!("✅ Transfer in {}: {} -> {} ({})", tx.hash, transfer.from, transfer.to, transfer.amount);

            // 4. Metadata through the registry
            let db_pool = connection::establish_connection(&config.database_url).await?;
            let registry = CurrencyRegistry::new(
                db_pool,
                &config.blockchain_id,
                client.clone(),
                IconResolver::new(&config)?,
                config.currency_cache_capacity,
            );
            match registry.resolve(&transfer.contract).await {
                Ok(currency) => info!(
                    "✅ {} ({}) decimals={} icon={:?}",
                    currency.name, currency.symbol, currency.decimals, currency.icon
                ),
                Err(e) => error!("❌ Token {} could not be resolved: {}", transfer.contract, e),
            }
            return Ok(());
        }
    }

    info!("No token transfers in block {}", number);
    Ok(())
}
