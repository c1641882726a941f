//! Lease queue over `sync_tasks`.
//!
//! A task is claimable while it is not done, its lease is older than the TTL and it has
//! retries left. Claiming stamps the lease in the same statement that selects the row, so
//! two workers can never walk away with the same block.

use crate::config::SyncSettings;
use crate::models::SyncTask;
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "lease";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub pending: i64,
    pub leased: i64,
    pub done: i64,
    pub exhausted: i64,
}

#[derive(Debug, Clone)]
pub struct LeaseQueue {
    pool: SqlitePool,
    blockchain_id: String,
    lease_ttl: Duration,
    max_retry: i64,
    batch_size: i64,
    start_block: i64,
}

impl LeaseQueue {
    pub fn new(pool: SqlitePool, settings: &SyncSettings) -> Self {
        Self {
            pool,
            blockchain_id: settings.blockchain_id.clone(),
            lease_ttl: settings.lease_ttl,
            max_retry: settings.max_retry,
            batch_size: settings.backfill_batch_size.max(1),
            start_block: settings.sync_start_block,
        }
    }

    pub fn max_retry(&self) -> i64 {
        self.max_retry
    }

    fn lease_cutoff(&self, now: i64) -> i64 {
        now - self.lease_ttl.as_secs() as i64
    }

    /// Claim one eligible block, or `None` when nothing is claimable.
    pub async fn claim(&self) -> Result<Option<i64>, sqlx::Error> {
        self.claim_at(chrono::Utc::now().timestamp()).await
    }

    pub async fn claim_at(&self, now: i64) -> Result<Option<i64>, sqlx::Error> {
        let cutoff = self.lease_cutoff(now);
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE sync_tasks SET lease_started_at = ?
            WHERE blockchain_id = ?
              AND done = 0 AND lease_started_at < ? AND retry_count < ?
              AND block_number = (
                SELECT block_number FROM sync_tasks
                WHERE blockchain_id = ?
                  AND done = 0 AND lease_started_at < ? AND retry_count < ?
                LIMIT 1
              )
            RETURNING block_number
            "#,
        )
        .bind(now)
        .bind(&self.blockchain_id)
        .bind(cutoff)
        .bind(self.max_retry)
        .bind(&self.blockchain_id)
        .bind(cutoff)
        .bind(self.max_retry)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(block) = claimed {
            debug!(service = SERVICE, chain_id = %self.blockchain_id, block, "claimed block");
        }
        Ok(claimed)
    }

    pub async fn complete(&self, block: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sync_tasks SET done = 1 WHERE blockchain_id = ? AND block_number = ?")
            .bind(&self.blockchain_id)
            .bind(block)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Release the lease and count a failed attempt.
    ///
    /// Returns `true` when this failure used up the last retry.
    pub async fn fail(&self, block: i64) -> Result<bool, sqlx::Error> {
        let retry_count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE sync_tasks SET lease_started_at = 0, retry_count = retry_count + 1
            WHERE blockchain_id = ? AND block_number = ?
            RETURNING retry_count
            "#,
        )
        .bind(&self.blockchain_id)
        .bind(block)
        .fetch_optional(&self.pool)
        .await?;

        let exhausted = retry_count.is_some_and(|count| count >= self.max_retry);
        if exhausted {
            warn!(
                service = SERVICE,
                chain_id = %self.blockchain_id,
                block,
                max_retry = self.max_retry,
                "block exhausted its retries and will no longer be claimed"
            );
        }
        Ok(exhausted)
    }

    pub async fn max_block(&self) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(block_number) FROM sync_tasks WHERE blockchain_id = ?",
        )
        .bind(&self.blockchain_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Create the missing tasks up to `upper_bound`, at most `batch_size` rows per write.
    pub async fn backfill(&self, upper_bound: i64) -> Result<u64, sqlx::Error> {
        let mut next = match self.max_block().await? {
            Some(max) => max + 1,
            None => self.start_block,
        };
        let mut inserted = 0u64;

        while next <= upper_bound {
            let end = (next + self.batch_size - 1).min(upper_bound);

            let mut tx = self.pool.begin().await?;
            let result = sqlx::query(
                r#"
                WITH RECURSIVE seq(n) AS (
                    SELECT ? UNION ALL SELECT n + 1 FROM seq WHERE n < ?
                )
                INSERT OR IGNORE INTO sync_tasks
                    (blockchain_id, block_number, done, lease_started_at, retry_count)
                SELECT ?, n, 0, 0, 0 FROM seq
                "#,
            )
            .bind(next)
            .bind(end)
            .bind(&self.blockchain_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            inserted += result.rows_affected();
            debug!(service = SERVICE, chain_id = %self.blockchain_id, from = next, to = end, "backfilled tasks");
            next = end + 1;
        }

        if inserted > 0 {
            info!(service = SERVICE, chain_id = %self.blockchain_id, inserted, upper_bound, "sync tasks created");
        }
        Ok(inserted)
    }

    pub async fn stats(&self) -> Result<TaskStats, sqlx::Error> {
        self.stats_at(chrono::Utc::now().timestamp()).await
    }

    pub async fn stats_at(&self, now: i64) -> Result<TaskStats, sqlx::Error> {
        let cutoff = self.lease_cutoff(now);
        let (pending, leased, done, exhausted) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN done = 0 AND retry_count < ? AND lease_started_at < ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN done = 0 AND retry_count < ? AND lease_started_at >= ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN done = 1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN done = 0 AND retry_count >= ? THEN 1 ELSE 0 END), 0)
            FROM sync_tasks WHERE blockchain_id = ?
            "#,
        )
        .bind(self.max_retry)
        .bind(cutoff)
        .bind(self.max_retry)
        .bind(cutoff)
        .bind(self.max_retry)
        .bind(&self.blockchain_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TaskStats { pending, leased, done, exhausted })
    }

    /// Blocks that ran out of retries, lowest first.
    pub async fn exhausted(&self, limit: i64) -> Result<Vec<SyncTask>, sqlx::Error> {
        sqlx::query_as::<_, SyncTask>(
            r#"
            SELECT blockchain_id, block_number, done, lease_started_at, retry_count
            FROM sync_tasks
            WHERE blockchain_id = ? AND done = 0 AND retry_count >= ?
            ORDER BY block_number ASC
            LIMIT ?
            "#,
        )
        .bind(&self.blockchain_id)
        .bind(self.max_retry)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn task(&self, block: i64) -> Result<Option<SyncTask>, sqlx::Error> {
        sqlx::query_as::<_, SyncTask>(
            r#"
            SELECT blockchain_id, block_number, done, lease_started_at, retry_count
            FROM sync_tasks WHERE blockchain_id = ? AND block_number = ?
            "#,
        )
        .bind(&self.blockchain_id)
        .bind(block)
        .fetch_optional(&self.pool)
        .await
    }
}
