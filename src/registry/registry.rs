//! Service Registry
//!
//! Maps service names to their published state and runs the reload pipeline.
//! The published `ServiceState` lives behind an `ArcSwap`: queries load it
//! without locking, and reloads replace it with a single atomic swap.

use super::disposer::Disposer;
use super::types::*;
use crate::config::types::ServiceConfig;
use crate::index::DATA_FILE;
use crate::index::builder::IndexBuilder;
use crate::index::spatial::SpatialIndex;
use crate::ingestion::reader::{parse_features, read_source};
use crate::stats::HitCounter;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

struct ServiceSlot {
    config: Arc<ServiceConfig>,
    state: ArcSwap<ServiceState>,
}

/// A ready service, resolved for the duration of one query.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    pub config: Arc<ServiceConfig>,
    pub index: Arc<SpatialIndex>,
}

pub struct ServiceRegistry {
    services: DashMap<String, Arc<ServiceSlot>>,
    store_root: PathBuf,
    hits: Arc<dyn HitCounter>,
    reloads: TaskTracker,
    disposer: Disposer,
    accepting: AtomicBool,
}

impl ServiceRegistry {
    /// Creates a registry with every service in `STARTING` state. No reload is started.
    pub fn new(
        configs: Vec<ServiceConfig>,
        store_root: impl Into<PathBuf>,
        hits: Arc<dyn HitCounter>,
    ) -> Arc<Self> {
        let services = DashMap::new();
        for config in configs {
            services.insert(
                config.name.clone(),
                Arc::new(ServiceSlot {
                    config: Arc::new(config),
                    state: ArcSwap::from_pointee(ServiceState::starting()),
                }),
            );
        }

        Arc::new(Self {
            services,
            store_root: store_root.into(),
            hits,
            reloads: TaskTracker::new(),
            disposer: Disposer::new(),
            accepting: AtomicBool::new(true),
        })
    }

    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    pub fn contains(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Current published state of `service`.
    ///
    /// Counts a hit when the service is ready to answer queries.
    pub fn get(&self, service: &str) -> Option<Arc<ServiceState>> {
        let state = self.services.get(service)?.state.load_full();
        if state.status == ServiceStatus::Ready {
            self.hits.hit(service);
        }
        Some(state)
    }

    /// Resolves a service for querying, or says why it cannot be queried.
    pub fn lookup(&self, service: &str) -> Result<ServiceHandle, ServiceError> {
        let handle = self.resolve(service)?;
        self.hits.hit(service);
        Ok(handle)
    }

    /// Like `lookup` without counting a hit; used to retry against a newer index.
    pub fn resolve(&self, service: &str) -> Result<ServiceHandle, ServiceError> {
        let slot = self
            .services
            .get(service)
            .map(|slot| slot.value().clone())
            .ok_or(ServiceError::NotFound)?;
        let state = slot.state.load();

        match (state.status, &state.index) {
            (ServiceStatus::Ready, Some(index)) => Ok(ServiceHandle {
                config: slot.config.clone(),
                index: index.clone(),
            }),
            (ServiceStatus::Starting, _) => Err(ServiceError::NotReady),
            _ => Err(ServiceError::Unavailable),
        }
    }

    /// Status of every service.
    pub fn snapshot(&self) -> BTreeMap<String, ServiceStatus> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state.load().status))
            .collect()
    }

    /// Detailed per-service view for the health endpoint.
    pub fn summaries(&self) -> BTreeMap<String, ServiceSummary> {
        self.services
            .iter()
            .map(|entry| {
                let state = entry.value().state.load();
                let summary = ServiceSummary {
                    status: state.status,
                    store: state.index.as_ref().map(|index| index.name().to_string()),
                    records: state.index.as_ref().map(|index| index.len()),
                    generation: state.generation,
                    last_error: state.last_error.clone(),
                    pending_disposals: self.disposer.pending_for(entry.key()),
                };
                (entry.key().clone(), summary)
            })
            .collect()
    }

    pub fn pending_disposals(&self) -> usize {
        self.disposer.pending()
    }

    /// Starts a background reload of `service` and returns immediately.
    ///
    /// The returned handle may be dropped; failures are logged and recorded
    /// against the service status either way.
    pub fn reload(self: &Arc<Self>, service: &str) -> JoinHandle<Result<ReloadReport, ReloadError>> {
        let registry = self.clone();
        let service = service.to_string();
        self.reloads
            .spawn(async move { registry.reload_now(&service).await })
    }

    /// Runs a reload of `service` to completion on the current task.
    pub async fn reload_now(&self, service: &str) -> Result<ReloadReport, ReloadError> {
        if !self.accepting.load(Ordering::SeqCst) {
            tracing::warn!("Ignoring reload of {}: shutting down", service);
            return Err(ReloadError::ShuttingDown);
        }
        let Some(slot) = self.services.get(service).map(|slot| slot.value().clone()) else {
            tracing::warn!("Cannot reload unknown service {}", service);
            return Err(ReloadError::UnknownService(service.to_string()));
        };

        tracing::info!("Updating service {}", service);
        let mut stage = ReloadStage::Reading;

        match self.run_pipeline(&slot, &mut stage).await {
            Ok(report) => {
                tracing::info!(
                    "New database {} of service {} ready ({} records, generation {})",
                    report.store,
                    service,
                    report.records,
                    report.generation
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(
                    "Reload of service {} failed while {}: {}",
                    service,
                    stage,
                    e
                );
                self.record_failure(&slot, &e);
                tracing::debug!("Reload of service {}: {}", service, ReloadStage::Failed);
                Err(e)
            }
        }
    }

    async fn run_pipeline(
        &self,
        slot: &ServiceSlot,
        stage: &mut ReloadStage,
    ) -> Result<ReloadReport, ReloadError> {
        let config = slot.config.clone();
        let service = config.name.clone();

        *stage = ReloadStage::Reading;
        tracing::debug!("Reload of service {}: {}", service, stage);
        let bytes = read_source(&config.file).await?;

        *stage = ReloadStage::Parsing;
        tracing::debug!("Reload of service {}: {} ({} bytes)", service, stage, bytes.len());
        let source = config.file.clone();
        let features =
            tokio::task::spawn_blocking(move || parse_features(&source, &bytes)).await??;

        *stage = ReloadStage::Building;
        tracing::debug!("Reload of service {}: {}", service, stage);
        let root = self.store_root.clone();
        let name = service.clone();
        let builder =
            tokio::task::spawn_blocking(move || IndexBuilder::create(&root, &name)).await??;

        *stage = ReloadStage::Inserting;
        tracing::debug!(
            "Reload of service {}: {} {} features into {}",
            service,
            stage,
            features.len(),
            builder.name()
        );
        let index = tokio::task::spawn_blocking(move || builder.insert_all(features)).await??;

        *stage = ReloadStage::Swapping;
        tracing::debug!("Reload of service {}: {}", service, stage);
        let report = self.publish(slot, Arc::new(index));

        *stage = ReloadStage::Done;
        Ok(report)
    }

    /// Atomically publishes `index` as the service's current index and retires
    /// whatever it replaced.
    fn publish(&self, slot: &ServiceSlot, index: Arc<SpatialIndex>) -> ReloadReport {
        let previous = slot.state.rcu(|current| ServiceState {
            status: ServiceStatus::Ready,
            index: Some(index.clone()),
            generation: current.generation + 1,
            last_error: None,
        });

        if let Some(old) = previous.index.clone() {
            self.disposer.retire(&slot.config.name, old);
        }

        ReloadReport {
            service: slot.config.name.clone(),
            store: index.name().to_string(),
            records: index.len(),
            generation: previous.generation + 1,
        }
    }

    /// Keeps a published index serving; only a service with nothing published
    /// moves to `ERROR`.
    fn record_failure(&self, slot: &ServiceSlot, error: &ReloadError) {
        let message = error.to_string();
        slot.state.rcu(|current| {
            let mut next = ServiceState::clone(current);
            if next.index.is_none() {
                next.status = ServiceStatus::Error;
            }
            next.last_error = Some(message.clone());
            next
        });
    }

    /// Removes store directories left behind by a previous process.
    ///
    /// Only call before the first reload.
    pub fn purge_stale_stores(&self) -> std::io::Result<usize> {
        let entries = match std::fs::read_dir(&self.store_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut purged = 0;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() && path.join(DATA_FILE).exists() {
                tracing::info!("Removing stale database {}", path.display());
                std::fs::remove_dir_all(&path)?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Stops accepting reloads, waits for in-flight reloads, retires every
    /// published index and waits for all disposals to complete.
    pub async fn shutdown(&self) -> DrainReport {
        self.accepting.store(false, Ordering::SeqCst);

        self.reloads.close();
        if !self.reloads.is_empty() {
            tracing::info!("Waiting for {} in-flight reloads", self.reloads.len());
        }
        self.reloads.wait().await;

        let slots: Vec<Arc<ServiceSlot>> =
            self.services.iter().map(|e| e.value().clone()).collect();
        for slot in slots {
            let previous = slot.state.rcu(|current| ServiceState {
                index: None,
                ..ServiceState::clone(current)
            });
            if let Some(index) = previous.index.clone() {
                self.disposer.retire(&slot.config.name, index);
            }
        }

        if self.disposer.pending() > 0 {
            tracing::info!("Waiting for {} disposals", self.disposer.pending());
        }
        self.disposer.drain().await
    }
}
