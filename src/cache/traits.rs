//! What a resource cache stores and what a fetch hands back.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// An entity that can live in a `ResourceCache`.
///
/// A collection never holds two entities for which `same_entity` is true.
pub trait Cacheable: Clone + Send + Sync + DeserializeOwned + 'static {
  /// Lookup key inside a collection (blog slug, record id)
  fn cache_key(&self) -> String;

  /// Identity used when merging single entities into a collection.
  fn same_entity(&self, other: &Self) -> bool {
    self.cache_key() == other.cache_key()
  }
}

/// Data returned by `ResourceCache::fetch`, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// Completion time of the last successful fetch, if any
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn new(data: T, source: CacheSource, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source,
      cached_at,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// This call went to the network and succeeded
  Network,
  /// Served from memory inside the TTL
  CacheFresh,
  /// The network call failed; whatever was cached is returned
  Offline,
  /// Answered by a fetch another caller had in flight
  Coalesced,
}
