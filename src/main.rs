// Load configuration
// Set up logging
// Open the ledger database and seed the native currency
// Start the sync scheduler
// Serve the status API until ctrl-c

use evm_ledger_sync::{
    api,
    blockchain::{
        icon::IconResolver,
        notify::{ChannelNotifier, JobOutcome},
        EthClient, EthParser, SyncScheduler,
    },
    config::Config,
    db,
    state::AppState,
};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting evm-ledger-sync");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    info!("Database connection established");

    let native = db::currency::ensure_native(
        &db_pool,
        &config.blockchain_id,
        &config.native_name,
        &config.native_symbol,
        config.native_decimals,
    )
    .await?;
    info!("Native currency {} ({})", native.symbol, native.currency_id);

    // Job outcomes are only logged for now
    let (job_sender, mut job_receiver) = mpsc::channel::<JobOutcome>(1000);
    tokio::spawn(async move {
        while let Some(outcome) = job_receiver.recv().await {
            tracing::debug!(service = "notifier", ?outcome, "job outcome");
        }
    });

    let client = Arc::new(EthClient::new(&config)?);
    let parser = EthParser::new(
        db_pool.clone(),
        client,
        IconResolver::new(&config)?,
        config.sync_settings(),
    )
    .await?
    .with_notifier(Arc::new(ChannelNotifier::new(job_sender)));

    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(SyncScheduler::new(Arc::new(parser), config.polling_interval()));
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));
    info!("Sync scheduler started");

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db_pool: db_pool.clone(),
    });
    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting status server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = scheduler_handle.await;
    db_pool.close().await;

    Ok(())
}
