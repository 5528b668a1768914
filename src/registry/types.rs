use crate::index::spatial::SpatialIndex;
use crate::index::types::IndexError;
use crate::ingestion::reader::SourceError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Query availability of a service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    /// No index has been published yet.
    Starting,
    /// An index is published and serving queries.
    Ready,
    /// Every reload so far has failed and nothing is published.
    Error,
}

/// Published state of one service. Replaced wholesale on every change.
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub status: ServiceStatus,
    pub index: Option<Arc<SpatialIndex>>,
    /// Number of successful swaps.
    pub generation: u64,
    pub last_error: Option<String>,
}

impl ServiceState {
    pub fn starting() -> Self {
        Self {
            status: ServiceStatus::Starting,
            index: None,
            generation: 0,
            last_error: None,
        }
    }
}

/// Stages of a reload, in order. Any stage may short-circuit to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStage {
    Reading,
    Parsing,
    Building,
    Inserting,
    Swapping,
    Done,
    Failed,
}

impl fmt::Display for ReloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReloadStage::Reading => "READING",
            ReloadStage::Parsing => "PARSING",
            ReloadStage::Building => "BUILDING",
            ReloadStage::Inserting => "INSERTING",
            ReloadStage::Swapping => "SWAPPING",
            ReloadStage::Done => "DONE",
            ReloadStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("service {0} is not configured")]
    UnknownService(String),
    #[error("registry is shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("index build failed: {0}")]
    IndexBuild(#[from] IndexError),
    #[error("reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Summary of a successful reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub service: String,
    pub store: String,
    pub records: usize,
    pub generation: u64,
}

/// Why a service cannot answer queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service not found")]
    NotFound,
    #[error("Service not ready yet")]
    NotReady,
    #[error("Service is unavailable")]
    Unavailable,
}

/// Per-service entry of the health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSummary {
    pub status: ServiceStatus,
    pub store: Option<String>,
    pub records: Option<usize>,
    pub generation: u64,
    pub last_error: Option<String>,
    pub pending_disposals: usize,
}

/// Outcome of `ServiceRegistry::shutdown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub disposed: usize,
    pub failed: usize,
}
