use crate::blockchain::parser::{ChainParser, CycleOutcome};
use crate::error::SyncError;
use backon::{ExponentialBuilder, Retryable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const SERVICE: &str = "scheduler";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// Another drain was still running.
    Skipped,
    Drained {
        tasks_created: u64,
        completed: usize,
        failed: usize,
    },
}

/// Resets the syncing flag however the drain ends.
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Timer-driven, single-flight driver for one chain.
pub struct SyncScheduler<P: ChainParser> {
    parser: Arc<P>,
    interval: Duration,
    syncing: AtomicBool,
}

impl<P: ChainParser + 'static> SyncScheduler<P> {
    pub fn new(parser: Arc<P>, interval: Duration) -> Self {
        Self {
            parser,
            interval,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Run cycles until nothing is claimable. Returns [`TickReport::Skipped`] without doing
    /// anything when a drain is already in flight.
    pub async fn tick(&self, shutdown: &CancellationToken) -> Result<TickReport, SyncError> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(service = SERVICE, chain_id = %self.parser.chain_id(), "sync in progress, skipping tick");
            return Ok(TickReport::Skipped);
        }
        let _guard = SyncGuard(&self.syncing);

        let tasks_created = self.parser.refresh_tasks().await?;
        let mut completed = 0;
        let mut failed = 0;

        while !shutdown.is_cancelled() {
            match self.parser.one_cycle().await? {
                CycleOutcome::Idle => break,
                CycleOutcome::Completed { .. } => completed += 1,
                CycleOutcome::Failed { .. } => failed += 1,
            }
        }

        Ok(TickReport::Drained {
            tasks_created,
            completed,
            failed,
        })
    }

    /// [`Self::tick`] with exponential backoff on loop-fatal errors.
    pub async fn tick_with_backoff(&self, shutdown: &CancellationToken) -> Result<TickReport, SyncError> {
        let chain_id = self.parser.chain_id();
        (|| async { self.tick(shutdown).await })
            .retry(ExponentialBuilder::default().with_max_times(3))
            .when(|_| !shutdown.is_cancelled())
            .notify(|err: &SyncError, dur: Duration| {
                warn!(service = SERVICE, chain_id = %chain_id, "sync tick failed, retrying in {:?}: {}", dur, err);
            })
            .await
    }

    async fn run_tick(&self, shutdown: &CancellationToken) {
        let chain_id = self.parser.chain_id();
        match self.tick_with_backoff(shutdown).await {
            Ok(TickReport::Drained {
                tasks_created,
                completed,
                failed,
            }) => {
                if tasks_created > 0 || completed > 0 || failed > 0 {
                    info!(service = SERVICE, chain_id = %chain_id, tasks_created, completed, failed, "sync tick finished");
                }
            }
            Ok(TickReport::Skipped) => {}
            Err(e) => error!(service = SERVICE, chain_id = %chain_id, "sync tick abandoned: {}", e),
        }
    }

    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(service = SERVICE, chain_id = %self.parser.chain_id(), interval = ?self.interval, "Starting sync scheduler");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut running: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.is_syncing() {
                        debug!(service = SERVICE, chain_id = %self.parser.chain_id(), "previous sync still running");
                        continue;
                    }
                    let scheduler = self.clone();
                    let token = shutdown.clone();
                    running = Some(tokio::spawn(async move {
                        scheduler.run_tick(&token).await;
                    }));
                }
                _ = shutdown.cancelled() => {
                    info!(service = SERVICE, chain_id = %self.parser.chain_id(), "Shutting down sync scheduler");
                    break;
                }
            }
        }

        if let Some(handle) = running {
            let _ = handle.await;
        }
    }
}
