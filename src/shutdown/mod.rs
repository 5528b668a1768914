//! Shutdown Module
//!
//! Process exit is a three-phase state machine: `Running` → `Draining` → `Stopped`.
//!
//! ## Draining
//! 1. Listeners (HTTP and the admin socket) are told to stop accepting work.
//! 2. In-flight reloads finish, then every published index is retired.
//! 3. The coordinator waits on the disposal tracker until every retired store
//!    is closed and deleted, including stores retired by earlier reloads.
//!
//! The drain is bounded by a timeout and can be aborted by a second signal.
//! Either case, or a panic inside the drain, ends in `ExitStatus::UncleanShutdown`.
//!
//! ## Submodules
//! - **`types`**: Exit codes, phases and triggers.
//! - **`coordinator`**: The drain sequence.
//! - **`fault`**: Panic hook that turns uncaught panics into a shutdown trigger.

pub mod coordinator;
pub mod fault;
pub mod types;

#[cfg(test)]
mod tests;
