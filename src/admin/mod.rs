//! Admin Channel Module
//!
//! A local Unix-socket endpoint through which operators trigger service reloads
//! without restarting the process.
//!
//! ## Protocol
//! Each chunk read from a connection is one command. The only command is
//! `updateService <name>`; every reply is a single line terminated by `\r\n`.
//! Replies are sent as soon as the reload has been scheduled, not when it finishes.
//!
//! ## Submodules
//! - **`protocol`**: Command parsing and reply wording.
//! - **`server`**: Socket lifecycle, accept loop and dispatch.

pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;
