//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::storage::ResourceSnapshot;
use super::traits::{CacheResult, CacheSource, Cacheable};
use crate::error::ApiError;
use crate::query::{FetchOptions, FetcherFn};

/// Shown when a fetch times out and there is nothing cached.
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please check your connection and try again.";

/// User-facing messages for an empty cache after a failed fetch.
#[derive(Debug, Clone)]
pub struct ErrorMessages {
  pub timeout: String,
  pub unavailable: String,
}

impl ErrorMessages {
  /// Default messages for a resource, e.g. `for_resource("Skills")`.
  pub fn for_resource(label: &str) -> Self {
    Self {
      timeout: TIMEOUT_MESSAGE.to_string(),
      unavailable: format!(
        "{} data is temporarily unavailable. Please try again later.",
        label
      ),
    }
  }

  fn for_error(&self, err: &ApiError) -> &str {
    if err.is_timeout() {
      &self.timeout
    } else {
      &self.unavailable
    }
  }
}

/// Per-resource configuration of a `ResourceCache`.
#[derive(Debug, Clone)]
pub struct ResourcePolicy<T> {
  /// Resource name used in logs (e.g., "experiences")
  pub name: &'static str,
  /// How long fetched data stays fresh
  pub ttl: Duration,
  /// Display order applied to every fetched payload
  pub sort: Option<fn(&T, &T) -> Ordering>,
  pub messages: ErrorMessages,
}

impl<T> ResourcePolicy<T> {
  pub fn new(name: &'static str, label: &str) -> Self {
    Self {
      name,
      ttl: Duration::minutes(10),
      sort: None,
      messages: ErrorMessages::for_resource(label),
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_sort(mut self, sort: fn(&T, &T) -> Ordering) -> Self {
    self.sort = Some(sort);
    self
  }
}

struct Inner<T: Cacheable> {
  policy: ResourcePolicy<T>,
  fetcher: FetcherFn<Vec<T>>,
  state: watch::Sender<ResourceSnapshot<T>>,
  /// Serializes network fetches so concurrent callers share one request
  gate: Mutex<()>,
  /// Completed fetch attempts, successful or not
  attempts: AtomicU64,
  invalidated: AtomicBool,
}

/// Cached view of one remote collection.
///
/// Serves fresh data from memory, refetches when the TTL has expired, and
/// absorbs network failures into its observable state instead of returning
/// them. Cloning is cheap and clones share the same cache.
pub struct ResourceCache<T: Cacheable> {
  inner: Arc<Inner<T>>,
}

impl<T: Cacheable> ResourceCache<T> {
  /// Create an empty cache that loads data through `fetcher`.
  pub fn new(policy: ResourcePolicy<T>, fetcher: FetcherFn<Vec<T>>) -> Self {
    let (state, _) = watch::channel(ResourceSnapshot::default());
    Self {
      inner: Arc::new(Inner {
        policy,
        fetcher,
        state,
        gate: Mutex::new(()),
        attempts: AtomicU64::new(0),
        invalidated: AtomicBool::new(false),
      }),
    }
  }

  pub fn name(&self) -> &'static str {
    self.inner.policy.name
  }

  /// Current state of the cache.
  pub fn snapshot(&self) -> ResourceSnapshot<T> {
    self.inner.state.borrow().clone()
  }

  pub fn items(&self) -> Vec<T> {
    self.inner.state.borrow().items.clone()
  }

  /// Whether the last successful fetch is younger than the TTL.
  pub fn is_fresh(&self) -> bool {
    if self.inner.invalidated.load(AtomicOrdering::SeqCst) {
      return false;
    }
    let last_fetched_at = self.inner.state.borrow().last_fetched_at;
    match last_fetched_at {
      Some(fetched_at) => Utc::now() - fetched_at < self.inner.policy.ttl,
      None => false,
    }
  }

  /// Mark the cached data stale so the next `fetch` goes to the network.
  pub fn invalidate(&self) {
    self.inner.invalidated.store(true, AtomicOrdering::SeqCst);
  }

  /// Insert or replace a single entity, e.g. one loaded by a detail lookup.
  pub fn upsert(&self, entity: T) {
    self.inner.state.send_modify(|s| s.upsert(entity));
  }

  /// Fetch the collection with a cache-first strategy.
  ///
  /// 1. Fresh cache and no `force_refresh`: return it, nothing changes
  /// 2. Otherwise fetch from the network and replace the collection
  /// 3. On failure keep whatever is cached; only an empty cache gets an error
  ///
  /// Never fails: the result always holds the best data available.
  pub async fn fetch(&self, options: FetchOptions) -> CacheResult<Vec<T>> {
    let observed = self.inner.attempts.load(AtomicOrdering::SeqCst);

    if !options.force_refresh && self.serves_from_cache() {
      debug!(resource = self.name(), "serving fresh cache");
      let snapshot = self.snapshot();
      return CacheResult::new(snapshot.items, CacheSource::CacheFresh, snapshot.last_fetched_at);
    }

    let _gate = self.inner.gate.lock().await;

    // Another caller fetched while we waited; its outcome answers this call too
    if self.inner.attempts.load(AtomicOrdering::SeqCst) != observed {
      debug!(resource = self.name(), "reusing concurrent fetch");
      let snapshot = self.snapshot();
      return CacheResult::new(snapshot.items, CacheSource::Coalesced, snapshot.last_fetched_at);
    }

    let guard = LoadingGuard::start(&self.inner.state);
    let result = (self.inner.fetcher)().await;

    let source = match result {
      Ok(items) => {
        let sort = self.inner.policy.sort;
        let now = Utc::now();
        let count = items.len();
        self.inner.state.send_modify(|s| {
          s.store_fetched(items, sort, now);
          s.loading = false;
        });
        self.inner.invalidated.store(false, AtomicOrdering::SeqCst);
        debug!(resource = self.name(), count, "fetched from network");
        CacheSource::Network
      }
      Err(err) => {
        let message = self.inner.policy.messages.for_error(&err).to_string();
        let cached = self.inner.state.borrow().items.len();
        warn!(
          resource = self.name(),
          code = err.code(),
          error = %err,
          cached,
          "fetch failed"
        );
        self.inner.state.send_modify(|s| {
          s.store_failure(message);
          s.loading = false;
        });
        CacheSource::Offline
      }
    };

    self.inner.attempts.fetch_add(1, AtomicOrdering::SeqCst);
    drop(guard);

    let snapshot = self.snapshot();
    CacheResult::new(snapshot.items, source, snapshot.last_fetched_at)
  }

  fn serves_from_cache(&self) -> bool {
    let has_fetched_once = self.inner.state.borrow().has_fetched_once;
    has_fetched_once && self.is_fresh()
  }
}

impl<T: Cacheable> Clone for ResourceCache<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<T: Cacheable + std::fmt::Debug> std::fmt::Debug for ResourceCache<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResourceCache")
      .field("name", &self.inner.policy.name)
      .field("state", &*self.inner.state.borrow())
      .finish_non_exhaustive()
  }
}

/// Sets `loading` for the lifetime of a fetch and clears it on drop, so a
/// cancelled fetch cannot leave the cache stuck in the loading state.
struct LoadingGuard<'a, T> {
  state: &'a watch::Sender<ResourceSnapshot<T>>,
}

impl<'a, T> LoadingGuard<'a, T> {
  fn start(state: &'a watch::Sender<ResourceSnapshot<T>>) -> Self {
    state.send_modify(|s| s.loading = true);
    Self { state }
  }
}

impl<T> Drop for LoadingGuard<'_, T> {
  fn drop(&mut self) {
    self.state.send_if_modified(|s| {
      if s.loading {
        s.loading = false;
        true
      } else {
        false
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::{fetcher_fn, FetchState};
  use serde::{Deserialize, Serialize};
  use std::collections::VecDeque;
  use std::sync::atomic::AtomicU32;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: String,
    order: i32,
  }

  impl Cacheable for Item {
    fn cache_key(&self) -> String {
      self.id.clone()
    }
  }

  fn item(id: &str, order: i32) -> Item {
    Item {
      id: id.to_string(),
      order,
    }
  }

  type Script = Arc<std::sync::Mutex<VecDeque<Result<Vec<Item>, ApiError>>>>;

  /// Cache whose fetcher replays `responses` in order (then repeats the
  /// last one) after `delay`, counting network calls.
  fn scripted(
    policy: ResourcePolicy<Item>,
    responses: Vec<Result<Vec<Item>, ApiError>>,
    delay: std::time::Duration,
  ) -> (ResourceCache<Item>, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let script: Script = Arc::new(std::sync::Mutex::new(responses.into()));

    let calls_clone = calls.clone();
    let fetcher = fetcher_fn(move || {
      let calls = calls_clone.clone();
      let script = script.clone();
      async move {
        calls.fetch_add(1, AtomicOrdering::SeqCst);
        if !delay.is_zero() {
          tokio::time::sleep(delay).await;
        }
        let mut script = script.lock().unwrap();
        if script.len() > 1 {
          script.pop_front().unwrap()
        } else {
          script.front().cloned().unwrap()
        }
      }
    });

    (ResourceCache::new(policy, fetcher), calls)
  }

  fn policy() -> ResourcePolicy<Item> {
    ResourcePolicy::new("items", "Item")
  }

  #[tokio::test]
  async fn test_second_fetch_within_ttl_uses_cache() {
    let (cache, calls) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::ZERO,
    );

    let first = cache.fetch(FetchOptions::default()).await;
    let second = cache.fetch(FetchOptions::default()).await;

    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, vec![item("a", 1)]);
  }

  #[tokio::test]
  async fn test_force_refresh_always_fetches() {
    let (cache, calls) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;
    cache.fetch(FetchOptions::refresh()).await;
    cache.fetch(FetchOptions::refresh()).await;

    assert_eq!(calls.load(AtomicOrdering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_expired_cache_refetches() {
    let (cache, calls) = scripted(
      policy().with_ttl(Duration::zero()),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;
    assert!(!cache.is_fresh());
    cache.fetch(FetchOptions::default()).await;

    assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidate_forces_network() {
    let (cache, calls) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;
    cache.invalidate();
    assert!(!cache.is_fresh());
    cache.fetch(FetchOptions::default()).await;
    assert!(cache.is_fresh());

    assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_fetches_coalesce() {
    let (cache, calls) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1), item("b", 2)])],
      std::time::Duration::from_millis(50),
    );

    let (first, second) = tokio::join!(
      cache.fetch(FetchOptions::default()),
      cache.fetch(FetchOptions::default())
    );

    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Coalesced);
    assert_eq!(second.data.len(), 2);
  }

  #[tokio::test]
  async fn test_timeout_with_empty_cache_sets_message() {
    let (cache, _) = scripted(
      policy(),
      vec![Err(ApiError::Timeout)],
      std::time::Duration::ZERO,
    );

    let result = cache.fetch(FetchOptions::default()).await;
    let snapshot = cache.snapshot();

    assert_eq!(result.source, CacheSource::Offline);
    assert!(result.data.is_empty());
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.as_deref(), Some(TIMEOUT_MESSAGE));
    assert!(snapshot.last_fetched_at.is_none());
    assert_eq!(snapshot.state(), FetchState::Error);
  }

  #[tokio::test]
  async fn test_other_error_with_empty_cache_uses_resource_message() {
    let (cache, _) = scripted(
      policy(),
      vec![Err(ApiError::Transport("connection refused".into()))],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;

    let snapshot = cache.snapshot();
    assert_eq!(
      snapshot.error.as_deref(),
      Some("Item data is temporarily unavailable. Please try again later.")
    );
    assert!(!snapshot.has_data_loaded());
  }

  #[tokio::test]
  async fn test_server_error_keeps_stale_items() {
    let (cache, _) = scripted(
      policy(),
      vec![
        Ok(vec![item("a", 1), item("b", 2), item("c", 3)]),
        Err(ApiError::Server {
          status: 500,
          message: None,
        }),
      ],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;
    let fetched_at = cache.snapshot().last_fetched_at;
    let result = cache.fetch(FetchOptions::refresh()).await;
    let snapshot = cache.snapshot();

    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(snapshot.items.len(), 3);
    assert!(snapshot.error.is_none());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.last_fetched_at, fetched_at);
    assert_eq!(snapshot.state(), FetchState::Loaded);
  }

  #[tokio::test]
  async fn test_success_after_error_clears_message() {
    let (cache, _) = scripted(
      policy(),
      vec![Err(ApiError::Timeout), Ok(vec![item("a", 1)])],
      std::time::Duration::ZERO,
    );

    cache.fetch(FetchOptions::default()).await;
    assert!(cache.snapshot().error.is_some());

    cache.fetch(FetchOptions::default()).await;
    let snapshot = cache.snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot.has_data_loaded());
  }

  #[tokio::test]
  async fn test_policy_sort_applied() {
    let (cache, _) = scripted(
      policy().with_sort(|a: &Item, b: &Item| b.order.cmp(&a.order)),
      vec![Ok(vec![item("a", 1), item("b", 3), item("c", 2)])],
      std::time::Duration::ZERO,
    );

    let result = cache.fetch(FetchOptions::default()).await;
    let ids: Vec<&str> = result.data.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_loading_visible_while_in_flight() {
    let (cache, _) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::from_millis(50),
    );
    let task = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.fetch(FetchOptions::default()).await })
    };

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(cache.snapshot().state(), FetchState::Loading);

    task.await.unwrap();
    assert_eq!(cache.snapshot().state(), FetchState::Loaded);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancelled_fetch_resets_loading() {
    let (cache, _) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1)])],
      std::time::Duration::from_millis(50),
    );

    let result = tokio::time::timeout(
      std::time::Duration::from_millis(10),
      cache.fetch(FetchOptions::default()),
    )
    .await;

    assert!(result.is_err());
    assert!(!cache.snapshot().loading);
    assert!(!cache.snapshot().has_fetched_once);
  }

  #[tokio::test]
  async fn test_upsert_does_not_mark_fetched() {
    let (cache, calls) = scripted(
      policy(),
      vec![Ok(vec![item("a", 1), item("b", 2)])],
      std::time::Duration::ZERO,
    );

    cache.upsert(item("b", 9));
    assert_eq!(cache.items(), vec![item("b", 9)]);
    assert!(!cache.snapshot().has_data_loaded());

    cache.fetch(FetchOptions::default()).await;
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    assert_eq!(cache.items(), vec![item("a", 1), item("b", 2)]);
  }
}
