//! Generation jobs: records, ids, live progress and per-phase work.

/// Phase drivers.
pub mod driver;
/// Job id generation.
pub mod id;
/// Persisted job record and request normalization.
pub mod model;
/// Live progress tracker.
pub mod progress;
