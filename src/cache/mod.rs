//! Generic caching layer for remote content collections.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Caches keyed entities in display order, one collection per resource
//! - Serves data from memory while it is younger than the resource TTL
//! - Coalesces concurrent fetches into one network request
//! - Provides basic offline mode (serve stale cache when network unavailable)

mod layer;
mod storage;
mod traits;

pub use layer::{ErrorMessages, ResourceCache, ResourcePolicy, TIMEOUT_MESSAGE};
pub use storage::ResourceSnapshot;
pub use traits::{CacheResult, CacheSource, Cacheable};
