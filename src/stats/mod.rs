//! Usage Statistics Module
//!
//! Per-service, per-day hit counters. The registry only knows the `HitCounter`
//! trait; `UsageStatistics` is the file-backed implementation wired in by the binary.

pub mod usage;

#[cfg(test)]
mod tests;

/// Notified on every successful service lookup.
pub trait HitCounter: Send + Sync {
    fn hit(&self, service: &str);
}

/// Discards every hit.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHitCounter;

impl HitCounter for NoopHitCounter {
    fn hit(&self, _service: &str) {}
}
