//! Caching utilities.
//!
//! The registry caches dashboard statistics for a short TTL; every write
//! through the service invalidates them.

pub mod timed_cache;

pub use timed_cache::TimedCache;
