//! Statistics Module Tests
//!
//! Checks per-day counting and persistence of the usage file.

#[cfg(test)]
mod tests {
    use crate::stats::usage::UsageStatistics;
    use crate::stats::{HitCounter, NoopHitCounter};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_hits_are_counted_per_service_and_day() {
        let dir = tempfile::tempdir().unwrap();
        let stats = UsageStatistics::open(dir.path().join("statistics.json"));

        stats.hit_on("parks", day(2024, 3, 1));
        stats.hit_on("parks", day(2024, 3, 1));
        stats.hit_on("parks", day(2024, 3, 2));
        stats.hit_on("toilets", day(2024, 3, 1));

        assert_eq!(stats.count("parks", day(2024, 3, 1)), 2);
        assert_eq!(stats.count("parks", day(2024, 3, 2)), 1);
        assert_eq!(stats.count("toilets", day(2024, 3, 1)), 1);
        assert_eq!(stats.count("unknown", day(2024, 3, 1)), 0);
    }

    #[test]
    fn test_day_keys_are_zero_padded() {
        let dir = tempfile::tempdir().unwrap();
        let stats = UsageStatistics::open(dir.path().join("statistics.json"));

        stats.hit_on("parks", day(2024, 1, 5));

        let snapshot = stats.snapshot();
        assert!(snapshot["parks"].contains_key("2024-01-05"));
    }

    #[tokio::test]
    async fn test_flush_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");

        let stats = UsageStatistics::open(&path);
        stats.hit_on("parks", day(2024, 3, 1));
        stats.flush().await.unwrap();

        let reopened = UsageStatistics::open(&path);
        assert_eq!(reopened.count("parks", day(2024, 3, 1)), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");
        std::fs::write(&path, b"not json").unwrap();

        let stats = UsageStatistics::open(&path);

        assert!(stats.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_flusher_persists_hits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");
        let stats = UsageStatistics::open(&path);
        let (stop_tx, stop_rx) = watch::channel(false);
        let flusher = stats.spawn_flusher(stop_rx);

        stats.hit("parks");

        let mut saved = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if path.exists() {
                saved = true;
                break;
            }
        }
        stop_tx.send(true).unwrap();
        flusher.await.unwrap();

        assert!(saved, "flusher should write the statistics file");
    }

    #[tokio::test]
    async fn test_flusher_stops_on_signal_then_final_flush_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");
        let stats = UsageStatistics::open(&path);
        let (stop_tx, stop_rx) = watch::channel(false);
        let flusher = stats.spawn_flusher(stop_rx);

        for _ in 0..100 {
            stats.hit_on("parks", day(2024, 3, 1));
            tokio::task::yield_now().await;
        }
        stop_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), flusher)
            .await
            .expect("flusher should stop once signalled")
            .unwrap();

        stats.hit_on("parks", day(2024, 3, 1));
        stats.flush().await.unwrap();

        let reopened = UsageStatistics::open(&path);
        assert_eq!(reopened.count("parks", day(2024, 3, 1)), 101);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_flusher_signalled_before_start_exits() {
        let dir = tempfile::tempdir().unwrap();
        let stats = UsageStatistics::open(dir.path().join("statistics.json"));
        let (_stop_tx, stop_rx) = watch::channel(true);

        let flusher = stats.spawn_flusher(stop_rx);

        tokio::time::timeout(Duration::from_secs(5), flusher)
            .await
            .expect("flusher should not start")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_flushes_keep_latest_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statistics.json");
        let stats = UsageStatistics::open(&path);

        let mut writers = Vec::new();
        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            writers.push(tokio::spawn(async move {
                for _ in 0..10 {
                    stats.hit_on("parks", day(2024, 3, 1));
                    stats.flush().await.unwrap();
                }
            }));
        }
        for writer in writers {
            writer.await.unwrap();
        }
        stats.flush().await.unwrap();

        let reopened = UsageStatistics::open(&path);
        assert_eq!(reopened.count("parks", day(2024, 3, 1)), 80);
    }

    #[test]
    fn test_noop_counter_accepts_hits() {
        NoopHitCounter.hit("anything");
    }
}
