//! Background Disposal
//!
//! Retired indexes are closed and deleted on the blocking pool. Every disposal is
//! tracked, so shutdown can wait for all of them with a single completion signal.

use super::types::DrainReport;
use crate::index::spatial::SpatialIndex;

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::task::TaskTracker;

pub struct Disposer {
    tracker: TaskTracker,
    /// store name -> service name, for every retired index not yet disposed.
    pending: Arc<DashMap<String, String>>,
    disposed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

impl Disposer {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            pending: Arc::new(DashMap::new()),
            disposed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Moves `index` to the pending set and starts closing and deleting it.
    ///
    /// Failures are logged and counted, never retried.
    pub fn retire(&self, service: &str, index: Arc<SpatialIndex>) {
        let store = index.name().to_string();
        self.pending.insert(store.clone(), service.to_string());
        tracing::info!("Removing database {} of service {}", store, service);

        let pending = self.pending.clone();
        let disposed = self.disposed.clone();
        let failed = self.failed.clone();

        self.tracker.spawn(async move {
            let result = tokio::task::spawn_blocking(move || index.dispose()).await;

            match result {
                Ok(Ok(())) => {
                    disposed.fetch_add(1, Ordering::SeqCst);
                    tracing::info!("Removing database {} done", store);
                }
                Ok(Err(e)) => {
                    failed.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("Removing database {} failed: {}", store, e);
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::SeqCst);
                    tracing::error!("Disposal task for {} panicked: {}", store, e);
                }
            }

            pending.remove(&store);
        });
    }

    /// Number of retired indexes whose disposal has not finished.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_for(&self, service: &str) -> usize {
        self.pending
            .iter()
            .filter(|entry| entry.value() == service)
            .count()
    }

    /// Closes the tracker and waits for every outstanding disposal to finish.
    pub async fn drain(&self) -> DrainReport {
        self.tracker.close();
        self.tracker.wait().await;
        DrainReport {
            disposed: self.disposed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

impl Default for Disposer {
    fn default() -> Self {
        Self::new()
    }
}
