//! Index Construction
//!
//! An `IndexBuilder` owns a freshly created store directory until it is either
//! sealed into a `SpatialIndex` or discarded. Nothing else can observe a builder,
//! so insertion needs no synchronisation.

use super::DATA_FILE;
use super::spatial::SpatialIndex;
use super::types::{IndexError, IndexedFeature, Slot};
use crate::ingestion::types::Feature;

use geo::BoundingRect;
use rstar::{AABB, RTree};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct IndexBuilder {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    cursor: u64,
    entries: HashMap<String, IndexedFeature>,
    inserted: usize,
}

impl IndexBuilder {
    /// Creates a new store directory `<root>/<service>_<uuid>`.
    ///
    /// The random suffix keeps the name distinct from every live or retired
    /// store of the same service.
    pub fn create(root: &Path, service: &str) -> Result<Self, IndexError> {
        let name = format!("{}_{}", store_prefix(service), uuid::Uuid::new_v4().simple());
        let path = root.join(&name);

        std::fs::create_dir_all(&path).map_err(IndexError::io(&path))?;
        let data_path = path.join(DATA_FILE);
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create_new(true)
            .open(&data_path)
            .map_err(IndexError::io(&data_path))?;

        tracing::debug!("Created store {} at {}", name, path.display());

        Ok(Self {
            name,
            path,
            writer: BufWriter::new(file),
            cursor: 0,
            entries: HashMap::new(),
            inserted: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one feature to the store. A later feature with the same id
    /// replaces the earlier one.
    pub fn insert(&mut self, feature: &Feature) -> Result<(), IndexError> {
        let position = self.inserted;
        let key = feature
            .key()
            .ok_or(IndexError::MissingId { position })?;

        let geometry = feature
            .geometry
            .to_geo()
            .map_err(|source| IndexError::InvalidGeometry {
                id: key.clone(),
                source,
            })?;
        let rect = geometry
            .bounding_rect()
            .ok_or_else(|| IndexError::InvalidGeometry {
                id: key.clone(),
                source: crate::ingestion::types::GeometryError::Empty,
            })?;

        let bytes = serde_json::to_vec(feature)?;
        let data_path = self.path.join(DATA_FILE);
        self.writer
            .write_all(&bytes)
            .map_err(IndexError::io(&data_path))?;

        let slot = Slot {
            offset: self.cursor,
            len: bytes.len() as u32,
        };
        self.cursor += bytes.len() as u64;
        self.inserted += 1;

        let envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );
        self.entries.insert(
            key,
            IndexedFeature {
                seq: position,
                slot,
                envelope,
            },
        );
        Ok(())
    }

    /// Inserts every feature and seals the index. On any failure the store
    /// directory is removed before the error is returned.
    pub fn insert_all(mut self, features: Vec<Feature>) -> Result<SpatialIndex, IndexError> {
        for feature in &features {
            if let Err(e) = self.insert(feature) {
                let name = self.name.clone();
                if let Err(discard_err) = self.discard() {
                    tracing::warn!("Failed to discard store {}: {}", name, discard_err);
                }
                return Err(e);
            }
        }
        self.finish()
    }

    /// Flushes the data file and bulk-loads the R-tree.
    pub fn finish(self) -> Result<SpatialIndex, IndexError> {
        let data_path = self.path.join(DATA_FILE);
        let file = self
            .writer
            .into_inner()
            .map_err(|e| IndexError::io(&data_path)(e.into_error()))?;
        file.sync_data().map_err(IndexError::io(&data_path))?;

        let mut keys = HashMap::with_capacity(self.entries.len());
        let mut objects = Vec::with_capacity(self.entries.len());
        for (key, entry) in self.entries {
            keys.insert(key, entry.slot);
            objects.push(entry);
        }

        tracing::debug!("Sealed store {} with {} features", self.name, keys.len());

        Ok(SpatialIndex::new(
            self.name,
            self.path,
            RTree::bulk_load(objects),
            keys,
            file,
        ))
    }

    /// Drops the half-built store and removes its directory.
    pub fn discard(self) -> Result<(), IndexError> {
        let IndexBuilder { path, writer, .. } = self;
        drop(writer);
        std::fs::remove_dir_all(&path).map_err(IndexError::io(&path))
    }
}

/// Service names are user supplied; keep only filesystem-safe characters.
fn store_prefix(service: &str) -> String {
    service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
