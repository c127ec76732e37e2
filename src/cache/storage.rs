//! In-memory collection storage for a single resource.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;

use super::traits::Cacheable;
use crate::query::FetchState;

/// Snapshot of one resource collection and its fetch bookkeeping.
///
/// This is what consumers observe: every mutation publishes a new snapshot.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot<T> {
  /// Cached entities in display order
  pub items: Vec<T>,
  /// A request is in flight
  pub loading: bool,
  /// User-facing error, only set while `items` is empty
  pub error: Option<String>,
  /// When the last successful fetch completed
  pub last_fetched_at: Option<DateTime<Utc>>,
  /// Whether any fetch has ever succeeded
  pub has_fetched_once: bool,
}

impl<T> Default for ResourceSnapshot<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      loading: false,
      error: None,
      last_fetched_at: None,
      has_fetched_once: false,
    }
  }
}

impl<T: Cacheable> ResourceSnapshot<T> {
  /// Current fetch state, derived from the flags.
  pub fn state(&self) -> FetchState {
    if self.loading {
      FetchState::Loading
    } else if self.error.is_some() {
      FetchState::Error
    } else if self.has_fetched_once {
      FetchState::Loaded
    } else {
      FetchState::Idle
    }
  }

  /// True once a fetch has succeeded and returned something to show.
  pub fn has_data_loaded(&self) -> bool {
    self.has_fetched_once && !self.items.is_empty()
  }

  /// Replace the collection with a fetched payload.
  ///
  /// Duplicate keys keep their first occurrence, then `sort` orders the result.
  pub(crate) fn store_fetched(
    &mut self,
    items: Vec<T>,
    sort: Option<fn(&T, &T) -> Ordering>,
    fetched_at: DateTime<Utc>,
  ) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<T> = items
      .into_iter()
      .filter(|item| seen.insert(item.cache_key()))
      .collect();

    if let Some(compare) = sort {
      // Stable, so equal keys keep server order
      unique.sort_by(compare);
    }

    self.items = unique;
    self.error = None;
    self.has_fetched_once = true;
    self.last_fetched_at = Some(fetched_at);
  }

  /// Record a failed fetch, keeping stale items when there are any.
  pub(crate) fn store_failure(&mut self, message: String) {
    if self.items.is_empty() {
      self.error = Some(message);
    } else {
      self.error = None;
    }
  }

  /// Insert or replace a single entity.
  ///
  /// The first matching entity is updated in place and any later matches are
  /// dropped; a new one goes to the end.
  pub(crate) fn upsert(&mut self, entity: T) {
    match self.items.iter().position(|existing| existing.same_entity(&entity)) {
      Some(index) => {
        let mut position = 0;
        self.items.retain(|existing| {
          let keep = position == index || !existing.same_entity(&entity);
          position += 1;
          keep
        });
        // Nothing before `index` matched, so it still points at the first match
        self.items[index] = entity;
      }
      None => self.items.push(entity),
    }
    if !self.items.is_empty() {
      self.error = None;
    }
  }
}
