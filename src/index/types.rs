use crate::ingestion::types::GeometryError;

use rstar::{AABB, RTreeObject};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("storage I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("feature encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("feature #{position} has no usable id")]
    MissingId { position: usize },
    #[error("feature {id} has an invalid geometry: {source}")]
    InvalidGeometry {
        id: String,
        #[source]
        source: GeometryError,
    },
    #[error("entry {0} not found")]
    NotFound(String),
    #[error("index {0} is closed")]
    Closed(String),
    #[error("index {0} lock poisoned")]
    Poisoned(String),
}

impl IndexError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> IndexError {
        move |source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Location of one encoded feature inside the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: u64,
    pub len: u32,
}

/// An R-tree entry: the feature's bounding box plus where to read it from.
///
/// `seq` is the insertion sequence number, used to return results in a
/// deterministic order.
#[derive(Debug, Clone)]
pub struct IndexedFeature {
    pub seq: usize,
    pub slot: Slot,
    pub envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}
