//! Spatial Index Module
//!
//! A disk-backed store of GeoJSON features with an in-memory R-tree over their
//! bounding boxes.
//!
//! ## Core Concepts
//! - **Store**: Each index owns a uniquely named directory holding one data file.
//!   Features are written once, as JSON, at recorded offsets, and read back on demand.
//! - **R-tree**: Built in bulk when the builder is sealed; candidate lookup is by
//!   envelope intersection, followed by an exact containment check in `geo`.
//! - **Lifecycle**: `IndexBuilder` -> `SpatialIndex` (read-only) -> `close` -> `delete`.
//!   Closing waits for in-flight readers, so a retired index is never torn down
//!   underneath a query.

pub mod builder;
pub mod spatial;
pub mod types;


/// Name of the data file inside every store directory.
pub const DATA_FILE: &str = "features.dat";
