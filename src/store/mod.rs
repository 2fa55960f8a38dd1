//! Local persistence: a key-value port and the job library built on it.

/// Key-value persistence port and adapters.
pub mod kv;
/// Bucketed job library.
pub mod library;
