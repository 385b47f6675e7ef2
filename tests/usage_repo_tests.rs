// NetworkUsageRepo tests: init, upsert, prune, totals, daily rollup

mod common;

use common::{temp_repo, usage_row};
use hostwatch::models::UsageTotals;
use hostwatch::rates::now_ms;
use tempfile::TempDir;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[tokio::test]
async fn usage_repo_connect_and_init() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert_eq!(repo.count_samples().await.unwrap(), 0);
    assert_eq!(repo.retention_ms(), 30 * DAY_MS);
}

#[tokio::test]
async fn usage_repo_connect_creates_parent_dir() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/usage.db");
    let repo = hostwatch::usage_repo::NetworkUsageRepo::connect(path.to_str().unwrap(), 30, 1)
        .await
        .unwrap();
    repo.init().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn usage_repo_upsert_is_idempotent_per_timestamp() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    let at = now_ms();

    repo.upsert_sample(&usage_row(at, Some(100), Some(200)))
        .await
        .unwrap();
    repo.upsert_sample(&usage_row(at, Some(300), None))
        .await
        .unwrap();

    assert_eq!(repo.count_samples().await.unwrap(), 1);
    let stored = repo.get_sample(at).await.unwrap().unwrap();
    assert_eq!(stored.inbound_bytes_delta, Some(300));
    assert_eq!(stored.outbound_bytes_delta, None);
    assert_eq!(stored.inbound_bytes_total, Some(1_000_000));
}

#[tokio::test]
async fn usage_repo_get_missing_sample_is_none() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    assert!(repo.get_sample(42).await.unwrap().is_none());
}

#[tokio::test]
async fn usage_repo_saturates_huge_counters() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    let at = now_ms();
    let mut row = usage_row(at, Some(u64::MAX), Some(1));
    row.inbound_bytes_total = Some(u64::MAX);
    repo.upsert_sample(&row).await.unwrap();

    let stored = repo.get_sample(at).await.unwrap().unwrap();
    assert_eq!(stored.inbound_bytes_total, Some(i64::MAX as u64));
    assert_eq!(stored.inbound_bytes_delta, Some(i64::MAX as u64));
}

#[tokio::test]
async fn usage_repo_prune_removes_rows_past_retention() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    let now = now_ms();
    let old = now - 31 * DAY_MS;
    let kept = now - 29 * DAY_MS;

    for at in [old, kept, now] {
        repo.upsert_sample(&usage_row(at, Some(10), Some(10)))
            .await
            .unwrap();
    }
    assert_eq!(repo.count_samples().await.unwrap(), 3);

    let removed = repo.prune_expired(now).await.unwrap();
    assert_eq!(removed, 1);
    assert!(repo.get_sample(old).await.unwrap().is_none());
    assert!(repo.get_sample(kept).await.unwrap().is_some());
    assert!(repo.get_sample(now).await.unwrap().is_some());

    // nothing left to prune
    assert_eq!(repo.prune_expired(now).await.unwrap(), 0);
}

#[tokio::test]
async fn usage_repo_prune_before_keeps_cutoff_row() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    for at in [1_000, 2_000, 3_000] {
        repo.upsert_sample(&usage_row(at, None, None)).await.unwrap();
    }
    assert_eq!(repo.prune_before(2_000).await.unwrap(), 1);
    assert_eq!(repo.count_samples().await.unwrap(), 2);
}

#[tokio::test]
async fn usage_repo_totals_treat_missing_deltas_as_zero() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    let now = now_ms();
    repo.upsert_sample(&usage_row(now - 10_000, None, None))
        .await
        .unwrap();
    repo.upsert_sample(&usage_row(now - 5_000, Some(500), Some(50)))
        .await
        .unwrap();
    repo.upsert_sample(&usage_row(now, Some(700), None))
        .await
        .unwrap();

    let totals = repo.usage_totals(now - repo.retention_ms()).await.unwrap();
    assert_eq!(
        totals,
        UsageTotals {
            sample_count: 3,
            first_at_ms: Some(now - 10_000),
            last_at_ms: Some(now),
            inbound_bytes: 1_200,
            outbound_bytes: 50,
        }
    );
}

#[tokio::test]
async fn usage_repo_totals_empty_store() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    let totals = repo.usage_totals(0).await.unwrap();
    assert_eq!(totals, UsageTotals::default());
    assert!(repo.daily_usage(0).await.unwrap().is_empty());
    assert!(repo.latest_sample(0).await.unwrap().is_none());
}

#[tokio::test]
async fn usage_repo_daily_rollup_groups_by_utc_day() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    // 2026-03-01T00:00:00Z
    let day1 = 1_772_323_200_000_i64;
    let day2 = day1 + DAY_MS;

    repo.upsert_sample(&usage_row(day1 + 1_000, Some(100), Some(1)))
        .await
        .unwrap();
    repo.upsert_sample(&usage_row(day1 + 6_000, Some(200), Some(2)))
        .await
        .unwrap();
    repo.upsert_sample(&usage_row(day2 + 1_000, Some(400), None))
        .await
        .unwrap();

    let daily = repo.daily_usage(day1).await.unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].day, "2026-03-01");
    assert_eq!(daily[0].sample_count, 2);
    assert_eq!(daily[0].inbound_bytes, 300);
    assert_eq!(daily[0].outbound_bytes, 3);
    assert_eq!(daily[1].day, "2026-03-02");
    assert_eq!(daily[1].sample_count, 1);
    assert_eq!(daily[1].inbound_bytes, 400);
    assert_eq!(daily[1].outbound_bytes, 0);

    // cutoff excludes the first day
    let daily = repo.daily_usage(day2).await.unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].day, "2026-03-02");
}

#[tokio::test]
async fn usage_repo_latest_and_recent_points() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    for (i, at) in [10_000, 15_000, 20_000].into_iter().enumerate() {
        repo.upsert_sample(&usage_row(at, Some(i as u64), None))
            .await
            .unwrap();
    }

    let latest = repo.latest_sample(0).await.unwrap().unwrap();
    assert_eq!(latest.at_ms, 20_000);
    assert_eq!(latest.inbound_bytes_delta, Some(2));

    let recent = repo.samples_since(15_000).await.unwrap();
    let ats: Vec<i64> = recent.iter().map(|p| p.at_ms).collect();
    assert_eq!(ats, vec![15_000, 20_000]);

    // latest outside the horizon is not returned
    assert!(repo.latest_sample(25_000).await.unwrap().is_none());
}

#[tokio::test]
async fn usage_repo_snapshot_reads_everything_at_once() {
    let dir = TempDir::new().unwrap();
    let repo = temp_repo(&dir, 30).await;
    for at in [10_000, 15_000, 20_000] {
        repo.upsert_sample(&usage_row(at, Some(100), Some(10)))
            .await
            .unwrap();
    }

    let snapshot = repo.usage_snapshot(0, 15_000).await.unwrap();
    assert_eq!(snapshot.totals.sample_count, 3);
    assert_eq!(snapshot.totals.inbound_bytes, 300);
    assert_eq!(snapshot.daily.len(), 1);
    assert_eq!(snapshot.daily[0].sample_count, 3);
    assert_eq!(snapshot.latest.map(|l| l.at_ms), Some(20_000));
    assert_eq!(snapshot.recent.len(), 2);
}
