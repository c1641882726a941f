//! tests/scheduler_tests.rs - single-flight ticks and drain accounting with a scripted parser

use crate::{
    blockchain::{scheduler::TickReport, ChainParser, CycleOutcome, SyncScheduler},
    error::SyncError,
};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ScriptedParser {
    outcomes: Mutex<VecDeque<Result<CycleOutcome, SyncError>>>,
    refreshes: AtomicUsize,
    cycles: AtomicUsize,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedParser {
    fn with_outcomes(outcomes: Vec<Result<CycleOutcome, SyncError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ChainParser for ScriptedParser {
    type Block = ();
    type Tx = ();
    type Receipt = ();

    fn chain_id(&self) -> &str {
        "test"
    }

    async fn refresh_tasks(&self) -> Result<u64, SyncError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        Ok(2)
    }

    async fn one_cycle(&self) -> Result<CycleOutcome, SyncError> {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or(Ok(CycleOutcome::Idle))
    }

    async fn block_data_from_peer(&self, _block: i64) -> Result<(), SyncError> {
        Ok(())
    }

    async fn parse_tx(&self, _tx: &(), _receipt: &(), _timestamp: i64) -> Result<(), SyncError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_tick_drains_until_idle() {
    let parser = Arc::new(ScriptedParser::with_outcomes(vec![
        Ok(CycleOutcome::Completed { block: 1, transactions: 2 }),
        Ok(CycleOutcome::Failed { block: 2, error: "boom".to_string() }),
        Ok(CycleOutcome::Completed { block: 3, transactions: 0 }),
    ]));
    let scheduler = SyncScheduler::new(parser.clone(), Duration::from_secs(1));

    let report = scheduler.tick(&CancellationToken::new()).await.unwrap();
    assert_eq!(
        report,
        TickReport::Drained {
            tasks_created: 2,
            completed: 2,
            failed: 1
        }
    );
    assert_eq!(parser.cycles.load(Ordering::SeqCst), 4);
    assert!(!scheduler.is_syncing());
}

#[tokio::test]
async fn test_overlapping_tick_is_skipped() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let parser = Arc::new(ScriptedParser {
        gate: Some((entered.clone(), release.clone())),
        ..ScriptedParser::default()
    });
    let scheduler = Arc::new(SyncScheduler::new(parser.clone(), Duration::from_secs(1)));

    let first = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.tick(&CancellationToken::new()).await })
    };
    entered.notified().await;

    assert!(scheduler.is_syncing());
    assert_eq!(scheduler.tick(&CancellationToken::new()).await.unwrap(), TickReport::Skipped);

    release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert!(matches!(report, TickReport::Drained { .. }));
    assert_eq!(parser.refreshes.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_syncing());
}

#[tokio::test]
async fn test_fatal_cycle_error_clears_flag() {
    let parser = Arc::new(ScriptedParser::with_outcomes(vec![Err(SyncError::Database(
        sqlx::Error::PoolTimedOut,
    ))]));
    let scheduler = SyncScheduler::new(parser, Duration::from_secs(1));

    assert!(scheduler.tick(&CancellationToken::new()).await.is_err());
    assert!(!scheduler.is_syncing());
}

#[tokio::test]
async fn test_cancelled_tick_runs_no_cycles() {
    let parser = Arc::new(ScriptedParser::with_outcomes(vec![Ok(CycleOutcome::Completed {
        block: 1,
        transactions: 0,
    })]));
    let scheduler = SyncScheduler::new(parser.clone(), Duration::from_secs(1));
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let report = scheduler.tick(&shutdown).await.unwrap();
    assert_eq!(
        report,
        TickReport::Drained {
            tasks_created: 2,
            completed: 0,
            failed: 0
        }
    );
    assert_eq!(parser.cycles.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let parser = Arc::new(ScriptedParser::default());
    let scheduler = Arc::new(SyncScheduler::new(parser.clone(), Duration::from_millis(20)));
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(scheduler.run(shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
    assert!(parser.refreshes.load(Ordering::SeqCst) >= 1);
}
