//! Configuration Module
//!
//! Process configuration resolved once at startup: built-in defaults, overlaid by
//! a JSON file, overlaid by command-line flags. The core only consumes the
//! resolved, immutable `ServiceConfig` list.

pub mod loader;
pub mod types;
