//! GeoJSON Radius Query Server Library
//!
//! Serves "what lies within r meters of this point" queries over named GeoJSON
//! datasets ("services"). Every service can be reloaded from its source file
//! at runtime without interrupting queries. The binary (`main.rs`) wires these
//! modules together.
//!
//! ## Architecture Modules
//! - **`config`**: JSON configuration file, defaults and command-line overrides.
//! - **`ingestion`**: GeoJSON types and the source file reader.
//! - **`index`**: Disk-backed spatial index (R-tree over an append-only record file),
//!   one store directory per build.
//! - **`registry`**: Service lifecycle. Builds indexes in the background, publishes
//!   them atomically, and retires superseded ones once their readers are gone.
//! - **`query`**: Radius query pipeline (validation, lookup, distance, sort, limit)
//!   and the HTTP routes.
//! - **`admin`**: Unix-socket channel for `updateService <name>`.
//! - **`shutdown`**: Drain sequence, exit codes and panic capture.
//! - **`stats`**: Per-service, per-day usage counters persisted to a JSON file.

pub mod admin;
pub mod config;
pub mod index;
pub mod ingestion;
pub mod query;
pub mod registry;
pub mod shutdown;
pub mod stats;
