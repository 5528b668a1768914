use super::HitCounter;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

/// `service -> day (YYYY-MM-DD, UTC) -> hits`
pub type UsageTable = BTreeMap<String, BTreeMap<String, u64>>;

/// Hit counters persisted as a JSON file.
///
/// `hit` only touches memory and wakes the background flusher, so it is safe
/// to call from request handlers.
pub struct UsageStatistics {
    path: PathBuf,
    data: Mutex<UsageTable>,
    dirty: Notify,
    /// Held across snapshot, write and rename so flushes land in order.
    writing: tokio::sync::Mutex<()>,
}

impl UsageStatistics {
    /// Loads existing counters. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(
                    "Ignoring unreadable statistics file {}: {}",
                    path.display(),
                    e
                );
                UsageTable::new()
            }),
            Err(_) => UsageTable::new(),
        };

        Arc::new(Self {
            path,
            data: Mutex::new(data),
            dirty: Notify::new(),
            writing: tokio::sync::Mutex::new(()),
        })
    }

    /// Records one hit for `service` on `day`.
    pub fn hit_on(&self, service: &str, day: NaiveDate) {
        let key = day.format("%Y-%m-%d").to_string();
        match self.data.lock() {
            Ok(mut data) => {
                *data
                    .entry(service.to_string())
                    .or_default()
                    .entry(key)
                    .or_insert(0) += 1;
            }
            Err(_) => {
                tracing::error!("Statistics lock poisoned, dropping hit for {}", service);
                return;
            }
        }
        self.dirty.notify_one();
    }

    /// Hits recorded for `service` on `day`.
    pub fn count(&self, service: &str, day: NaiveDate) -> u64 {
        let key = day.format("%Y-%m-%d").to_string();
        self.data
            .lock()
            .ok()
            .and_then(|data| data.get(service).and_then(|days| days.get(&key)).copied())
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> UsageTable {
        self.data
            .lock()
            .map(|data| data.clone())
            .unwrap_or_default()
    }

    /// Writes the current counters to disk (temp file + rename).
    pub async fn flush(&self) -> Result<()> {
        let _writing = self.writing.lock().await;
        let bytes = serde_json::to_vec_pretty(&self.snapshot())?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    /// Spawns the background task that persists counters after each burst of hits.
    ///
    /// The task exits once `stop` turns `true`; a flush already under way
    /// completes first, so awaiting the handle leaves the file settled.
    pub fn spawn_flusher(self: &Arc<Self>, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        let stats = self.clone();
        tokio::spawn(async move {
            while !*stop.borrow() {
                tokio::select! {
                    _ = stats.dirty.notified() => {
                        if let Err(e) = stats.flush().await {
                            tracing::warn!("Failed to save statistics: {:#}", e);
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Statistics flusher stopped");
        })
    }
}

impl HitCounter for UsageStatistics {
    fn hit(&self, service: &str) {
        self.hit_on(service, Utc::now().date_naive());
    }
}
