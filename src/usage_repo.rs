// SQLite retention store for per-tick network usage.
// One row per tick keyed by `at` (Unix ms); writes upsert so re-sampling the same ms is idempotent.
// Byte counters are u64 in memory and saturate to i64::MAX on the way into SQLite.

use crate::models::{DailyUsage, NetworkUsageRow, UsageDeltaPoint, UsageSnapshot, UsageTotals};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub struct NetworkUsageRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl NetworkUsageRepo {
    pub async fn connect(
        path: &str,
        retention_days: u32,
        max_pool_size: u32,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size.max(1))
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub fn retention_ms(&self) -> i64 {
        self.retention_ms
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS network_usage_samples (
                at INTEGER PRIMARY KEY,
                ts TEXT NOT NULL,
                inbound_bytes_total INTEGER,
                outbound_bytes_total INTEGER,
                inbound_bytes_delta INTEGER,
                outbound_bytes_delta INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, row), fields(repo = "network_usage", operation = "upsert_sample", at = row.at_ms))]
    pub async fn upsert_sample(&self, row: &NetworkUsageRow) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO network_usage_samples
            (at, ts, inbound_bytes_total, outbound_bytes_total, inbound_bytes_delta, outbound_bytes_delta)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(at) DO UPDATE SET
                ts = excluded.ts,
                inbound_bytes_total = excluded.inbound_bytes_total,
                outbound_bytes_total = excluded.outbound_bytes_total,
                inbound_bytes_delta = excluded.inbound_bytes_delta,
                outbound_bytes_delta = excluded.outbound_bytes_delta
            "#,
        )
        .bind(row.at_ms)
        .bind(&row.taken_at_iso)
        .bind(row.inbound_bytes_total.map(to_db))
        .bind(row.outbound_bytes_total.map(to_db))
        .bind(row.inbound_bytes_delta.map(to_db))
        .bind(row.outbound_bytes_delta.map(to_db))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_sample(&self, at_ms: i64) -> anyhow::Result<Option<NetworkUsageRow>> {
        let row = sqlx::query(
            "SELECT at, ts, inbound_bytes_total, outbound_bytes_total, inbound_bytes_delta, outbound_bytes_delta
             FROM network_usage_samples WHERE at = $1",
        )
        .bind(at_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(parse_usage_row).transpose()
    }

    pub async fn count_samples(&self) -> anyhow::Result<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM network_usage_samples")
            .fetch_one(&self.pool)
            .await?;
        Ok(from_db(n))
    }

    /// Delete rows with `at < cutoff_ms`. Returns rows removed.
    #[instrument(skip(self), fields(repo = "network_usage", operation = "prune_before"))]
    pub async fn prune_before(&self, cutoff_ms: i64) -> anyhow::Result<u64> {
        let r = sqlx::query("DELETE FROM network_usage_samples WHERE at < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Delete rows older than the retention horizon relative to `now_ms`.
    pub async fn prune_expired(&self, now_ms: i64) -> anyhow::Result<u64> {
        self.prune_before(now_ms - self.retention_ms).await
    }

    /// Count, time span, and summed deltas (null deltas count as 0) for `at >= cutoff_ms`.
    #[instrument(skip(self), fields(repo = "network_usage", operation = "usage_totals"))]
    pub async fn usage_totals(&self, cutoff_ms: i64) -> anyhow::Result<UsageTotals> {
        let mut conn = self.pool.acquire().await?;
        query_totals(&mut *conn, cutoff_ms).await
    }

    /// Rollup by calendar day (UTC date prefix of `ts`), oldest day first.
    #[instrument(skip(self), fields(repo = "network_usage", operation = "daily_usage"))]
    pub async fn daily_usage(&self, cutoff_ms: i64) -> anyhow::Result<Vec<DailyUsage>> {
        let mut conn = self.pool.acquire().await?;
        query_daily(&mut *conn, cutoff_ms).await
    }

    /// Most recent row with `at >= cutoff_ms`.
    pub async fn latest_sample(&self, cutoff_ms: i64) -> anyhow::Result<Option<UsageDeltaPoint>> {
        let mut conn = self.pool.acquire().await?;
        query_latest(&mut *conn, cutoff_ms).await
    }

    /// Rows with `at >= cutoff_ms`, oldest first.
    #[instrument(skip(self), fields(repo = "network_usage", operation = "samples_since"))]
    pub async fn samples_since(&self, cutoff_ms: i64) -> anyhow::Result<Vec<UsageDeltaPoint>> {
        let mut conn = self.pool.acquire().await?;
        query_since(&mut *conn, cutoff_ms).await
    }

    /// Totals, daily rollup, latest row and recent rows read inside one transaction,
    /// so a concurrent upsert is either fully visible or not at all.
    #[instrument(skip(self), fields(repo = "network_usage", operation = "usage_snapshot"))]
    pub async fn usage_snapshot(
        &self,
        cutoff_ms: i64,
        recent_cutoff_ms: i64,
    ) -> anyhow::Result<UsageSnapshot> {
        let mut tx = self.pool.begin().await?;
        let totals = query_totals(&mut *tx, cutoff_ms).await?;
        let daily = query_daily(&mut *tx, cutoff_ms).await?;
        let latest = query_latest(&mut *tx, cutoff_ms).await?;
        let recent = query_since(&mut *tx, recent_cutoff_ms).await?;
        tx.commit().await?;
        Ok(UsageSnapshot {
            totals,
            daily,
            latest,
            recent,
        })
    }
}

async fn query_totals(
    conn: &mut SqliteConnection,
    cutoff_ms: i64,
) -> anyhow::Result<UsageTotals> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS sample_count, MIN(at) AS first_at, MAX(at) AS last_at,
                SUM(COALESCE(inbound_bytes_delta, 0)) AS total_inbound_bytes,
                SUM(COALESCE(outbound_bytes_delta, 0)) AS total_outbound_bytes
         FROM network_usage_samples WHERE at >= $1",
    )
    .bind(cutoff_ms)
    .fetch_one(&mut *conn)
    .await?;
    Ok(UsageTotals {
        sample_count: from_db(row.try_get("sample_count")?),
        first_at_ms: row.try_get("first_at")?,
        last_at_ms: row.try_get("last_at")?,
        inbound_bytes: row
            .try_get::<Option<i64>, _>("total_inbound_bytes")?
            .map(from_db)
            .unwrap_or(0),
        outbound_bytes: row
            .try_get::<Option<i64>, _>("total_outbound_bytes")?
            .map(from_db)
            .unwrap_or(0),
    })
}

async fn query_daily(
    conn: &mut SqliteConnection,
    cutoff_ms: i64,
) -> anyhow::Result<Vec<DailyUsage>> {
    let rows = sqlx::query(
        "SELECT substr(ts, 1, 10) AS day, COUNT(*) AS sample_count,
                SUM(COALESCE(inbound_bytes_delta, 0)) AS total_inbound_bytes,
                SUM(COALESCE(outbound_bytes_delta, 0)) AS total_outbound_bytes
         FROM network_usage_samples WHERE at >= $1
         GROUP BY day ORDER BY day ASC",
    )
    .bind(cutoff_ms)
    .fetch_all(&mut *conn)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(DailyUsage {
            day: row.try_get("day")?,
            sample_count: from_db(row.try_get("sample_count")?),
            inbound_bytes: row
                .try_get::<Option<i64>, _>("total_inbound_bytes")?
                .map(from_db)
                .unwrap_or(0),
            outbound_bytes: row
                .try_get::<Option<i64>, _>("total_outbound_bytes")?
                .map(from_db)
                .unwrap_or(0),
        });
    }
    Ok(out)
}

async fn query_latest(
    conn: &mut SqliteConnection,
    cutoff_ms: i64,
) -> anyhow::Result<Option<UsageDeltaPoint>> {
    let row = sqlx::query(
        "SELECT at, inbound_bytes_delta, outbound_bytes_delta
         FROM network_usage_samples WHERE at >= $1 ORDER BY at DESC LIMIT 1",
    )
    .bind(cutoff_ms)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(parse_delta_point).transpose()
}

async fn query_since(
    conn: &mut SqliteConnection,
    cutoff_ms: i64,
) -> anyhow::Result<Vec<UsageDeltaPoint>> {
    let rows = sqlx::query(
        "SELECT at, inbound_bytes_delta, outbound_bytes_delta
         FROM network_usage_samples WHERE at >= $1 ORDER BY at ASC",
    )
    .bind(cutoff_ms)
    .fetch_all(&mut *conn)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(parse_delta_point(row)?);
    }
    Ok(out)
}

fn to_db(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn from_db(v: i64) -> u64 {
    v.max(0) as u64
}

fn parse_usage_row(row: &SqliteRow) -> anyhow::Result<NetworkUsageRow> {
    Ok(NetworkUsageRow {
        at_ms: row.try_get("at")?,
        taken_at_iso: row.try_get("ts")?,
        inbound_bytes_total: row
            .try_get::<Option<i64>, _>("inbound_bytes_total")?
            .map(from_db),
        outbound_bytes_total: row
            .try_get::<Option<i64>, _>("outbound_bytes_total")?
            .map(from_db),
        inbound_bytes_delta: row
            .try_get::<Option<i64>, _>("inbound_bytes_delta")?
            .map(from_db),
        outbound_bytes_delta: row
            .try_get::<Option<i64>, _>("outbound_bytes_delta")?
            .map(from_db),
    })
}

fn parse_delta_point(row: &SqliteRow) -> anyhow::Result<UsageDeltaPoint> {
    Ok(UsageDeltaPoint {
        at_ms: row.try_get("at")?,
        inbound_bytes_delta: row
            .try_get::<Option<i64>, _>("inbound_bytes_delta")?
            .map(from_db),
        outbound_bytes_delta: row
            .try_get::<Option<i64>, _>("outbound_bytes_delta")?
            .map(from_db),
    })
}
