//! Ingestion Module
//!
//! Turns a service's source file into the records that get inserted into a fresh
//! spatial index.
//!
//! ## Workflow
//! 1. **Read**: Loads the whole source file into memory (`reader::read_source`).
//! 2. **Parse**: Decodes the bytes as a GeoJSON FeatureCollection (or a single Feature).
//! 3. **Hand-off**: The parsed `Feature`s are passed to the registry's reload pipeline,
//!    which inserts them into a new `SpatialIndex`.

pub mod reader;
pub mod types;

#[cfg(test)]
mod tests;
