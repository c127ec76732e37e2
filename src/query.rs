//! Fetch state and fetcher plumbing shared by the resource caches.
//!
//! Inspired by TanStack Query: a cache owns a fetcher closure that produces a
//! fresh future for every network attempt, and exposes the attempt's progress
//! as a `FetchState`.
//!
//! # Example
//!
//! ```ignore
//! let client = api_client.clone();
//! let fetcher = fetcher_fn(move || {
//!     let client = client.clone();
//!     async move { client.get_list::<Project>(&["projects"]).await }
//! });
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::error::ApiError;

/// The state of a resource fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
  /// Nothing has been requested yet
  Idle,
  /// A request is in flight
  Loading,
  /// Data is available (possibly stale after a failed refresh)
  Loaded,
  /// The last request failed and there is nothing to show
  Error,
}

impl FetchState {
  pub fn is_loading(&self) -> bool {
    matches!(self, FetchState::Loading)
  }

  pub fn label(&self) -> &'static str {
    match self {
      FetchState::Idle => "idle",
      FetchState::Loading => "loading",
      FetchState::Loaded => "loaded",
      FetchState::Error => "error",
    }
  }
}

/// Options for a single `fetch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
  /// Skip the freshness check and always go to the network
  pub force_refresh: bool,
}

impl FetchOptions {
  pub fn refresh() -> Self {
    Self {
      force_refresh: true,
    }
  }
}

/// A boxed future that returns a Result<T, ApiError>
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// A factory function that creates futures for fetching data
pub type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Box a closure returning a future into a `FetcherFn`.
pub fn fetcher_fn<T, F, Fut>(fetcher: F) -> FetcherFn<T>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
  Box::new(move || Box::pin(fetcher()))
}
