pub mod api_types;
pub mod blog;
pub mod cache;
pub mod client;
pub mod contact;
pub mod filter;
pub mod types;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::cmp::Ordering;
use tracing::debug;

use crate::cache::{CacheResult, Cacheable, ResourceCache, ResourcePolicy, ResourceSnapshot};
use crate::config::CacheConfig;
use crate::query::{fetcher_fn, FetchOptions, FetchState};

use blog::BlogService;
use cache::{
  certification_order, education_order, experience_order, project_order, skill_order,
  ResourceKind,
};
use client::ApiClient;
use types::{Certification, Education, Experience, PersonalInfo, Project, Skill};

/// Point-in-time view of one resource cache, independent of its item type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceStatus {
  pub kind: ResourceKind,
  pub state: FetchState,
  pub count: usize,
  pub error: Option<String>,
  pub last_fetched_at: Option<DateTime<Utc>>,
  pub has_data_loaded: bool,
}

impl ResourceStatus {
  fn of<T: Cacheable>(kind: ResourceKind, snapshot: &ResourceSnapshot<T>) -> Self {
    Self {
      kind,
      state: snapshot.state(),
      count: snapshot.items.len(),
      error: snapshot.error.clone(),
      last_fetched_at: snapshot.last_fetched_at,
      has_data_loaded: snapshot.has_data_loaded(),
    }
  }
}

/// Every resource cache of the site, shared by whatever renders pages.
///
/// Cloning shares the underlying caches.
#[derive(Clone)]
pub struct ContentStore {
  blogs: BlogService,
  experiences: ResourceCache<Experience>,
  projects: ResourceCache<Project>,
  skills: ResourceCache<Skill>,
  education: ResourceCache<Education>,
  certifications: ResourceCache<Certification>,
  portfolio: ResourceCache<PersonalInfo>,
}

impl ContentStore {
  pub fn new(client: ApiClient, config: &CacheConfig) -> Self {
    let ttl = config.ttl();

    let portfolio_client = client.clone();
    let portfolio_policy = ResourcePolicy::new(
      ResourceKind::PortfolioInfo.name(),
      ResourceKind::PortfolioInfo.label(),
    )
    .with_ttl(ttl);
    let portfolio = ResourceCache::new(
      portfolio_policy,
      fetcher_fn(move || {
        let client = portfolio_client.clone();
        async move {
          let info = client
            .get_data::<PersonalInfo>(ResourceKind::PortfolioInfo.endpoint())
            .await?;
          Ok(info.into_iter().collect())
        }
      }),
    );

    Self {
      blogs: BlogService::new(client.clone(), config.blog_ttl()),
      experiences: collection(&client, ResourceKind::Experiences, ttl, experience_order),
      projects: collection(&client, ResourceKind::Projects, ttl, project_order),
      skills: collection(&client, ResourceKind::Skills, ttl, skill_order),
      education: collection(&client, ResourceKind::Education, ttl, education_order),
      certifications: collection(
        &client,
        ResourceKind::Certifications,
        ttl,
        certification_order,
      ),
      portfolio,
    }
  }

  pub fn blogs(&self) -> &BlogService {
    &self.blogs
  }

  pub fn experiences(&self) -> &ResourceCache<Experience> {
    &self.experiences
  }

  pub fn projects(&self) -> &ResourceCache<Project> {
    &self.projects
  }

  pub fn skills(&self) -> &ResourceCache<Skill> {
    &self.skills
  }

  pub fn education(&self) -> &ResourceCache<Education> {
    &self.education
  }

  pub fn certifications(&self) -> &ResourceCache<Certification> {
    &self.certifications
  }

  /// The site owner's profile, once fetched
  pub fn personal_info(&self) -> Option<PersonalInfo> {
    self.portfolio.snapshot().items.into_iter().next()
  }

  pub fn status(&self, kind: ResourceKind) -> ResourceStatus {
    match kind {
      ResourceKind::Blogs => ResourceStatus::of(kind, &self.blogs.cache().snapshot()),
      ResourceKind::Experiences => ResourceStatus::of(kind, &self.experiences.snapshot()),
      ResourceKind::Projects => ResourceStatus::of(kind, &self.projects.snapshot()),
      ResourceKind::Skills => ResourceStatus::of(kind, &self.skills.snapshot()),
      ResourceKind::Education => ResourceStatus::of(kind, &self.education.snapshot()),
      ResourceKind::Certifications => ResourceStatus::of(kind, &self.certifications.snapshot()),
      ResourceKind::PortfolioInfo => ResourceStatus::of(kind, &self.portfolio.snapshot()),
    }
  }

  /// Status of every resource, in `ResourceKind::ALL` order.
  pub fn statuses(&self) -> Vec<ResourceStatus> {
    ResourceKind::ALL
      .into_iter()
      .map(|kind| self.status(kind))
      .collect()
  }

  /// Fetch one resource through its cache and report the resulting status.
  pub async fn fetch(&self, kind: ResourceKind, options: FetchOptions) -> ResourceStatus {
    match kind {
      ResourceKind::Blogs => log_result(kind, &self.blogs.fetch_blogs(options).await),
      ResourceKind::Experiences => log_result(kind, &self.experiences.fetch(options).await),
      ResourceKind::Projects => log_result(kind, &self.projects.fetch(options).await),
      ResourceKind::Skills => log_result(kind, &self.skills.fetch(options).await),
      ResourceKind::Education => log_result(kind, &self.education.fetch(options).await),
      ResourceKind::Certifications => {
        log_result(kind, &self.certifications.fetch(options).await)
      }
      ResourceKind::PortfolioInfo => log_result(kind, &self.portfolio.fetch(options).await),
    }
    self.status(kind)
  }

  /// Fetch several resources concurrently.
  pub async fn fetch_many(
    &self,
    kinds: &[ResourceKind],
    options: FetchOptions,
  ) -> Vec<ResourceStatus> {
    join_all(kinds.iter().map(|kind| self.fetch(*kind, options))).await
  }

  /// Fetch only the resources that have nothing to show and are not loading.
  ///
  /// This is how pages load their data: a page revisited within the session
  /// renders from the cache without asking it to revalidate.
  pub async fn ensure_loaded(&self, kinds: &[ResourceKind]) -> Vec<ResourceStatus> {
    let missing: Vec<ResourceKind> = kinds
      .iter()
      .copied()
      .filter(|kind| {
        let status = self.status(*kind);
        !status.has_data_loaded && !status.state.is_loading()
      })
      .collect();

    self.fetch_many(&missing, FetchOptions::default()).await;
    kinds.iter().map(|kind| self.status(*kind)).collect()
  }

  /// Mark a resource stale so its next fetch goes to the network.
  pub fn invalidate(&self, kind: ResourceKind) {
    match kind {
      ResourceKind::Blogs => self.blogs.cache().invalidate(),
      ResourceKind::Experiences => self.experiences.invalidate(),
      ResourceKind::Projects => self.projects.invalidate(),
      ResourceKind::Skills => self.skills.invalidate(),
      ResourceKind::Education => self.education.invalidate(),
      ResourceKind::Certifications => self.certifications.invalidate(),
      ResourceKind::PortfolioInfo => self.portfolio.invalidate(),
    }
  }
}

fn log_result<T>(kind: ResourceKind, result: &CacheResult<Vec<T>>) {
  debug!(
    resource = kind.name(),
    source = ?result.source,
    items = result.data.len(),
    cached_at = ?result.cached_at,
    "fetch finished"
  );
}

fn collection<T: Cacheable>(
  client: &ApiClient,
  kind: ResourceKind,
  ttl: chrono::Duration,
  sort: fn(&T, &T) -> Ordering,
) -> ResourceCache<T> {
  let policy = ResourcePolicy::new(kind.name(), kind.label())
    .with_ttl(ttl)
    .with_sort(sort);
  let client = client.clone();
  let fetcher = fetcher_fn(move || {
    let client = client.clone();
    async move { client.get_list::<T>(kind.endpoint()).await }
  });
  ResourceCache::new(policy, fetcher)
}
