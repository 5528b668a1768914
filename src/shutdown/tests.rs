//! Shutdown Module Tests
//!
//! ## Test Scopes
//! - **Exit Codes**: Four distinct codes, mapped from the trigger.
//! - **Drain**: Published stores are deleted before the coordinator returns.
//! - **Unclean Paths**: Timeout, second signal and repeated shutdown.
//! - **Faults**: Panics are reported through the fault channel.

#[cfg(test)]
mod tests {
    use crate::config::types::ServiceConfig;
    use crate::registry::registry::ServiceRegistry;
    use crate::shutdown::coordinator::ShutdownCoordinator;
    use crate::shutdown::fault::install_panic_hook;
    use crate::shutdown::types::{ExitStatus, ShutdownPhase, ShutdownTrigger};
    use crate::stats::NoopHitCounter;
    use serde_json::json;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn ready_registry(dir: &Path) -> Arc<ServiceRegistry> {
        let file = dir.join("stops.json");
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "a",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {}
            }]
        });
        std::fs::write(&file, serde_json::to_vec(&doc).unwrap()).unwrap();

        let registry = ServiceRegistry::new(
            vec![ServiceConfig {
                name: "stops".to_string(),
                file,
                max_radius: 500.0,
                max_results: 10,
            }],
            dir.join("stores"),
            Arc::new(NoopHitCounter),
        );
        registry.reload_now("stops").await.unwrap();
        registry
    }

    fn store_dirs(dir: &Path) -> usize {
        std::fs::read_dir(dir.join("stores"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    fn stuck_listener() -> tokio::task::JoinHandle<()> {
        tokio::spawn(std::future::pending::<()>())
    }

    // ============================================================
    // EXIT CODE TESTS
    // ============================================================

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes: HashSet<i32> = [
            ExitStatus::Ok,
            ExitStatus::Interrupted,
            ExitStatus::UncaughtFault,
            ExitStatus::UncleanShutdown,
        ]
        .iter()
        .map(|s| s.code())
        .collect();

        assert_eq!(codes.len(), 4);
        assert_eq!(ExitStatus::Ok.code(), 0);
    }

    #[test]
    fn test_trigger_exit_status() {
        assert_eq!(ShutdownTrigger::Terminate.exit_status(), ExitStatus::Ok);
        assert_eq!(
            ShutdownTrigger::Interrupt.exit_status(),
            ExitStatus::Interrupted
        );
        assert_eq!(
            ShutdownTrigger::Fault("boom".to_string()).exit_status(),
            ExitStatus::UncaughtFault
        );
    }

    // ============================================================
    // DRAIN TESTS
    // ============================================================

    #[tokio::test]
    async fn test_shutdown_disposes_published_stores() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        assert_eq!(store_dirs(dir.path()), 1);

        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let stop = coordinator.subscribe();
        assert_eq!(coordinator.phase(), ShutdownPhase::Running);

        let status = coordinator
            .shutdown(
                ShutdownTrigger::Interrupt,
                registry.clone(),
                vec![],
                std::future::pending(),
            )
            .await;

        assert_eq!(status, ExitStatus::Interrupted);
        assert_eq!(coordinator.phase(), ShutdownPhase::Stopped);
        assert!(*stop.borrow());
        assert_eq!(store_dirs(dir.path()), 0);
        assert_eq!(registry.pending_disposals(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_listeners() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

        let mut stop = coordinator.subscribe();
        let listener = tokio::spawn(async move {
            while !*stop.borrow() {
                if stop.changed().await.is_err() {
                    break;
                }
            }
        });

        let status = coordinator
            .shutdown(
                ShutdownTrigger::Terminate,
                registry,
                vec![listener],
                std::future::pending(),
            )
            .await;

        assert_eq!(status, ExitStatus::Ok);
    }

    // ============================================================
    // UNCLEAN PATH TESTS
    // ============================================================

    #[tokio::test]
    async fn test_drain_timeout_is_unclean() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(50));

        let status = coordinator
            .shutdown(
                ShutdownTrigger::Terminate,
                registry,
                vec![stuck_listener()],
                std::future::pending(),
            )
            .await;

        assert_eq!(status, ExitStatus::UncleanShutdown);
    }

    #[tokio::test]
    async fn test_second_signal_aborts_drain() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));

        let status = coordinator
            .shutdown(
                ShutdownTrigger::Interrupt,
                registry,
                vec![stuck_listener()],
                tokio::time::sleep(Duration::from_millis(20)),
            )
            .await;

        assert_eq!(status, ExitStatus::UncleanShutdown);
    }

    #[tokio::test]
    async fn test_repeated_shutdown_is_unclean() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

        let first = coordinator
            .shutdown(
                ShutdownTrigger::Terminate,
                registry.clone(),
                vec![],
                std::future::pending(),
            )
            .await;
        let second = coordinator
            .shutdown(
                ShutdownTrigger::Terminate,
                registry,
                vec![],
                std::future::pending(),
            )
            .await;

        assert_eq!(first, ExitStatus::Ok);
        assert_eq!(second, ExitStatus::UncleanShutdown);
    }

    #[tokio::test]
    async fn test_fault_trigger_exits_with_fault_code() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ready_registry(dir.path()).await;
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

        let status = coordinator
            .shutdown(
                ShutdownTrigger::Fault("listener failed".to_string()),
                registry,
                vec![],
                std::future::pending(),
            )
            .await;

        assert_eq!(status, ExitStatus::UncaughtFault);
    }

    // ============================================================
    // FAULT CAPTURE TESTS
    // ============================================================

    #[test]
    fn test_panic_hook_reports_panics() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        install_panic_hook(tx);

        let result = std::thread::spawn(|| panic!("index exploded")).join();
        assert!(result.is_err());

        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }
        assert!(
            reports.iter().any(|r| r.contains("index exploded")),
            "reports: {:?}",
            reports
        );
    }
}
