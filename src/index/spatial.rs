use super::types::{IndexError, IndexedFeature, Slot};
use crate::ingestion::types::Feature;

use geo::{BoundingRect, Contains, Polygon};
use rstar::{AABB, RTree};
use std::collections::HashMap;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// A sealed, read-only spatial index over one store directory.
///
/// Queries hold a read guard on the data file for their whole duration;
/// `close` takes the write guard, so it waits for every in-flight query and
/// all later queries fail with `IndexError::Closed`.
#[derive(Debug)]
pub struct SpatialIndex {
    name: String,
    path: PathBuf,
    tree: RTree<IndexedFeature>,
    keys: HashMap<String, Slot>,
    data: RwLock<Option<File>>,
}

impl SpatialIndex {
    pub(super) fn new(
        name: String,
        path: PathBuf,
        tree: RTree<IndexedFeature>,
        keys: HashMap<String, Slot>,
        file: File,
    ) -> Self {
        Self {
            name,
            path,
            tree,
            keys,
            data: RwLock::new(Some(file)),
        }
    }

    /// Name of the backing store (`<service>_<suffix>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.data.read().map(|guard| guard.is_none()).unwrap_or(true)
    }

    /// Returns the features whose geometry lies inside `shape`, in insertion order.
    pub fn within(&self, shape: &Polygon<f64>) -> Result<Vec<Feature>, IndexError> {
        self.within_any(std::slice::from_ref(shape))
    }

    /// Returns the features whose geometry lies inside any of `shapes`, each at
    /// most once, in insertion order.
    pub fn within_any(&self, shapes: &[Polygon<f64>]) -> Result<Vec<Feature>, IndexError> {
        let mut candidates: Vec<&IndexedFeature> = Vec::new();
        for shape in shapes {
            let Some(rect) = shape.bounding_rect() else {
                continue;
            };
            let query =
                AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
            candidates.extend(self.tree.locate_in_envelope_intersecting(&query));
        }
        candidates.sort_by_key(|entry| entry.seq);
        candidates.dedup_by_key(|entry| entry.seq);

        let guard = self
            .data
            .read()
            .map_err(|_| IndexError::Poisoned(self.name.clone()))?;
        let file = guard
            .as_ref()
            .ok_or_else(|| IndexError::Closed(self.name.clone()))?;

        let mut results = Vec::new();
        for entry in candidates {
            let feature = self.read_slot(file, entry.slot)?;
            // Geometry was validated on insert.
            if let Ok(geometry) = feature.geometry.to_geo()
                && shapes.iter().any(|shape| shape.contains(&geometry))
            {
                results.push(feature);
            }
        }

        tracing::trace!(
            "Index {} matched {} features within {} shapes",
            self.name,
            results.len(),
            shapes.len()
        );
        Ok(results)
    }

    /// Point lookup by feature id.
    pub fn get(&self, id: &str) -> Result<Feature, IndexError> {
        let guard = self
            .data
            .read()
            .map_err(|_| IndexError::Poisoned(self.name.clone()))?;
        let file = guard
            .as_ref()
            .ok_or_else(|| IndexError::Closed(self.name.clone()))?;

        let slot = self
            .keys
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        self.read_slot(file, *slot)
    }

    fn read_slot(&self, file: &File, slot: Slot) -> Result<Feature, IndexError> {
        let mut buf = vec![0u8; slot.len as usize];
        file.read_exact_at(&mut buf, slot.offset)
            .map_err(IndexError::io(&self.path))?;
        Ok(serde_json::from_slice(&buf)?)
    }

    /// Releases the data file once all in-flight readers are done. Idempotent.
    pub fn close(&self) -> Result<(), IndexError> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| IndexError::Poisoned(self.name.clone()))?;
        if guard.take().is_some() {
            tracing::debug!("Closed index {}", self.name);
        }
        Ok(())
    }

    /// Removes the store directory.
    pub fn delete(&self) -> Result<(), IndexError> {
        std::fs::remove_dir_all(&self.path).map_err(IndexError::io(&self.path))
    }

    /// Close, then delete.
    pub fn dispose(&self) -> Result<(), IndexError> {
        self.close()?;
        self.delete()
    }
}
