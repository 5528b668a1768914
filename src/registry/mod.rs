//! Service Registry Module
//!
//! Owns every configured service and the lifecycle of its spatial index.
//!
//! ## Lifecycle
//! 1. **Reload**: A background task reads the source, parses it, builds a fresh index
//!    in a new store directory and inserts every record
//!    (`READING -> PARSING -> BUILDING -> INSERTING -> SWAPPING -> DONE`).
//! 2. **Swap**: The new index and `READY` status are published in one atomic pointer
//!    swap; readers see either the old state or the new one.
//! 3. **Retire**: The replaced index moves to the pending-disposal set and is closed
//!    and deleted in the background once its in-flight readers are done.
//! 4. **Drain**: On shutdown, in-flight reloads are awaited, every published index is
//!    retired, and the registry waits for all disposals to finish.
//!
//! A failed reload never takes a working service offline: status only becomes
//! `ERROR` when there is no published index to keep serving.

pub mod disposer;
pub mod registry;
pub mod types;
