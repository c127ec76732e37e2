//! Blog listing cache, single-post lookups, and view counting.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::cache::{CacheResult, ResourceCache, ResourcePolicy};
use crate::config::RenderContext;
use crate::error::ApiError;
use crate::query::{fetcher_fn, FetchOptions};

use super::cache::ResourceKind;
use super::client::{ApiClient, RequestScope};
use super::filter::{filter_blogs, BlogFilters};
use super::types::Blog;

/// Why a detail lookup produced no blog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlogDetailError {
  /// The post does not exist; callers should send the reader back to the listing
  NotFound,
  /// The backend could not answer; callers should offer a retry
  ApiError,
}

/// Outcome of resolving a blog post by slug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogDetailResult {
  pub blog: Option<Blog>,
  pub error: Option<BlogDetailError>,
}

impl BlogDetailResult {
  fn found(blog: Blog) -> Self {
    Self {
      blog: Some(blog),
      error: None,
    }
  }

  fn failed(error: BlogDetailError) -> Self {
    Self {
      blog: None,
      error: Some(error),
    }
  }

  /// The reader should be sent back to the listing.
  pub fn should_redirect(&self) -> bool {
    self.error == Some(BlogDetailError::NotFound)
  }
}

/// Blog data access: the shared listing cache plus detail and view endpoints.
#[derive(Clone)]
pub struct BlogService {
  client: ApiClient,
  cache: ResourceCache<Blog>,
}

impl BlogService {
  pub fn new(client: ApiClient, ttl: chrono::Duration) -> Self {
    let kind = ResourceKind::Blogs;
    let policy = ResourcePolicy::new(kind.name(), kind.label()).with_ttl(ttl);
    let fetch_client = client.clone();
    let fetcher = fetcher_fn(move || {
      let client = fetch_client.clone();
      async move { client.get_list::<Blog>(kind.endpoint()).await }
    });

    Self {
      client,
      cache: ResourceCache::new(policy, fetcher),
    }
  }

  /// The listing cache shared by list and detail views
  pub fn cache(&self) -> &ResourceCache<Blog> {
    &self.cache
  }

  /// Fetch the published listing (cache-first).
  pub async fn fetch_blogs(&self, options: FetchOptions) -> CacheResult<Vec<Blog>> {
    self.cache.fetch(options).await
  }

  /// Apply listing filters to whatever the cache currently holds.
  pub fn filtered(&self, filters: &BlogFilters) -> Vec<Blog> {
    filter_blogs(&self.cache.snapshot().items, filters)
  }

  /// Merge a single post into the listing cache (upsert by id or slug).
  pub fn add_blog_to_list(&self, blog: Blog) {
    self.cache.upsert(blog);
  }

  /// Resolve a post by slug through the single-post endpoint.
  ///
  /// Works before the listing was ever fetched, so deep links resolve. A found
  /// post is merged into the listing cache.
  pub async fn get_blog_by_slug(&self, slug: &str) -> BlogDetailResult {
    let slug = slug.trim();
    if slug.is_empty() {
      return BlogDetailResult::failed(BlogDetailError::NotFound);
    }

    match self
      .client
      .get_data::<Blog>(&["blogs", "published", slug])
      .await
    {
      Ok(Some(blog)) => {
        self.add_blog_to_list(blog.clone());
        BlogDetailResult::found(blog)
      }
      Ok(None) | Err(ApiError::NotFound) => {
        debug!(slug, "blog not found");
        BlogDetailResult::failed(BlogDetailError::NotFound)
      }
      Err(err) => {
        warn!(slug, code = err.code(), error = %err, "blog lookup failed");
        BlogDetailResult::failed(BlogDetailError::ApiError)
      }
    }
  }

  /// Increment a post's view counter and return the updated post, if sent.
  ///
  /// Failures are logged and yield `None`.
  pub async fn increment_view_count(&self, blog_id: &str) -> Option<Blog> {
    let result = self
      .client
      .post::<_, Blog>(&["blogs", blog_id, "view"], &json!({}), RequestScope::Public)
      .await;

    match result {
      Ok(envelope) => envelope.data,
      Err(err) => {
        warn!(blog_id, code = err.code(), error = %err, "failed to increment view count");
        None
      }
    }
  }

  pub fn render_context(&self) -> RenderContext {
    self.client.context()
  }
}

/// One visit to a blog post page.
///
/// Counts the view at most once per visit, and never while pre-rendering on
/// the server.
#[derive(Debug, Default)]
pub struct BlogPageVisit {
  view_recorded: bool,
}

impl BlogPageVisit {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fire the view counter in the background.
  ///
  /// Returns the task handle when a request was started, `None` when the
  /// view was already counted or the page is being pre-rendered.
  pub fn record_view(
    &mut self,
    service: &BlogService,
    blog_id: &str,
  ) -> Option<tokio::task::JoinHandle<()>> {
    if self.view_recorded || !service.render_context().is_browser() {
      return None;
    }
    self.view_recorded = true;

    let service = service.clone();
    let blog_id = blog_id.to_string();
    Some(tokio::spawn(async move {
      service.increment_view_count(&blog_id).await;
    }))
  }
}
