use crate::commands::Page;
use crate::config::Config;
use crate::content::blog::BlogPageVisit;
use crate::content::cache::ResourceKind;
use crate::content::client::ApiClient;
use crate::content::contact::ContactService;
use crate::content::filter::BlogFilters;
use crate::content::types::{Blog, ContactForm, PersonalInfo};
use crate::content::{ContentStore, ResourceStatus};
use crate::query::{FetchOptions, FetchState};
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, warn};

/// Outcome of opening a single blog post
#[derive(Debug)]
pub enum BlogView {
  Found(String),
  /// Post does not exist; the reader belongs on the listing
  Redirect(String),
  Unavailable(String),
}

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Every resource cache
  store: ContentStore,

  /// Contact form state
  contact: ContactService,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = ApiClient::new(&config)?;
    Ok(Self::with_client(config, client))
  }

  pub fn with_client(config: Config, client: ApiClient) -> Self {
    let store = ContentStore::new(client.clone(), &config.cache);
    let contact = ContactService::new(client, config.contact.success_reset());
    Self {
      config,
      store,
      contact,
    }
  }

  pub fn store(&self) -> &ContentStore {
    &self.store
  }

  /// Load what `page` needs.
  ///
  /// Without `refresh` only resources with nothing to show are requested.
  pub async fn load_page(&self, page: &Page, refresh: bool) -> Vec<ResourceStatus> {
    debug!(page = page.name, refresh, "loading page");
    if refresh {
      self
        .store
        .fetch_many(page.resources, FetchOptions::refresh())
        .await
    } else {
      self.store.ensure_loaded(page.resources).await
    }
  }

  /// Load and render a page as plain text.
  pub async fn show_page(&self, page: &Page, refresh: bool) -> String {
    let statuses = self.load_page(page, refresh).await;

    let mut out = format!("== {} ==\n", page.name);
    for status in &statuses {
      out.push('\n');
      out.push_str(&self.render_resource(status));
    }
    out
  }

  fn render_resource(&self, status: &ResourceStatus) -> String {
    if let Some(notice) = notice(status) {
      return format!("{}\n{}\n", status.kind.label(), notice);
    }

    match status.kind {
      ResourceKind::PortfolioInfo => match self.store.personal_info() {
        Some(info) => render_profile(&info),
        None => "Profile\n  (no profile yet)\n".to_string(),
      },
      ResourceKind::Experiences => {
        let lines = self.store.experiences().items().into_iter().map(|e| {
          let end = if e.is_current {
            "present".to_string()
          } else {
            e.end_date.unwrap_or_default()
          };
          format!("{} at {} ({} - {})", e.position, e.company_name, e.start_date, end)
        });
        section("Experience", lines)
      }
      ResourceKind::Projects => {
        let lines = self.store.projects().items().into_iter().map(|p| {
          let summary = p.short_description.unwrap_or(p.description);
          format!("{}: {}", p.title, summary)
        });
        section("Projects", lines)
      }
      ResourceKind::Skills => {
        let lines = self.store.skills().items().into_iter().map(|s| match s.proficiency {
          Some(level) => format!("{} ({}%)", s.name, level),
          None => s.name,
        });
        section("Skills", lines)
      }
      ResourceKind::Education => {
        let lines = self.store.education().items().into_iter().map(|e| {
          format!(
            "{} in {}, {}",
            e.degree, e.field_of_study, e.institution_name
          )
        });
        section("Education", lines)
      }
      ResourceKind::Certifications => {
        let lines = self.store.certifications().items().into_iter().map(|c| {
          let issued = c.issue_date.unwrap_or_else(|| "undated".to_string());
          format!(
            "{} by {} ({})",
            c.certification_name, c.issuing_organization, issued
          )
        });
        section("Certifications", lines)
      }
      ResourceKind::Blogs => {
        let blogs = self.store.blogs().cache().items();
        section("Blogs", blogs.iter().map(blog_line))
      }
    }
  }

  /// Fetch the listing and render the filtered posts.
  pub async fn list_blogs(&self, filters: &BlogFilters, refresh: bool) -> String {
    let options = if refresh {
      FetchOptions::refresh()
    } else {
      FetchOptions::default()
    };
    let status = self.store.fetch(ResourceKind::Blogs, options).await;
    if let Some(notice) = notice(&status) {
      return format!("{}\n", notice);
    }

    let blogs = self.store.blogs().filtered(filters);
    if blogs.is_empty() {
      return "No posts match the current filters.\n".to_string();
    }
    section(
      &format!("Blogs ({} of {})", blogs.len(), status.count),
      blogs.iter().map(blog_line),
    )
  }

  /// Open a post by slug and count the view.
  pub async fn open_blog(&self, slug: &str) -> BlogView {
    let service = self.store.blogs();
    let result = service.get_blog_by_slug(slug).await;

    if let Some(blog) = &result.blog {
      let mut visit = BlogPageVisit::new();
      if let Some(handle) = visit.record_view(service, &blog.id) {
        // The CLI exits right after printing, so let the request land first
        if let Err(err) = handle.await {
          warn!(blog_id = %blog.id, error = %err, "view count task did not finish");
        }
      }
      return BlogView::Found(render_blog(blog));
    }

    if !result.should_redirect() {
      return BlogView::Unavailable(
        "The blog post could not be loaded right now. Please try again.\n".to_string(),
      );
    }
    debug!(slug, "blog post missing, redirecting to the listing");
    BlogView::Redirect(format!(
      "Blog post '{}' was not found. See `folio blogs` for all posts.\n",
      slug
    ))
  }

  /// Submit the contact form and return the confirmation text.
  ///
  /// A rejected submission surfaces the form's error message.
  pub async fn send_contact(&self, form: &ContactForm) -> Result<String> {
    let response = self.contact.submit(form).await;
    match self.contact.state().error {
      Some(message) => Err(eyre!("{}", message)),
      None => Ok(response.message),
    }
  }

  /// One line per resource cache.
  pub fn status_report(&self) -> String {
    let mut out = format!(
      "{} ({:?})\n",
      self.config.api.url, self.config.render_context
    );
    for status in self.store.statuses() {
      let fetched = status
        .last_fetched_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
      out.push_str(&format!(
        "{:<15} {:<8} {:>4} items  fetched {}\n",
        status.kind.name(),
        status.state.label(),
        status.count,
        fetched
      ));
      if let Some(err) = &status.error {
        out.push_str(&format!("{:<15} {}\n", "", err));
      }
    }
    out
  }
}

/// Loading or error text to show instead of a resource's items
fn notice(status: &ResourceStatus) -> Option<String> {
  match status.state {
    FetchState::Loading => Some("  loading...".to_string()),
    FetchState::Error => status.error.as_ref().map(|e| format!("  {}", e)),
    FetchState::Idle | FetchState::Loaded => None,
  }
}

fn section(title: &str, lines: impl Iterator<Item = String>) -> String {
  let mut out = format!("{}\n", title);
  let mut empty = true;
  for line in lines {
    empty = false;
    out.push_str("  ");
    out.push_str(&line);
    out.push('\n');
  }
  if empty {
    out.push_str("  (nothing here yet)\n");
  }
  out
}

fn render_profile(info: &PersonalInfo) -> String {
  let mut out = format!("{}\n  {}\n", info.name, info.tagline);
  for paragraph in &info.description {
    out.push_str(&format!("  {}\n", paragraph));
  }
  if let Some(email) = &info.email {
    out.push_str(&format!("  email: {}\n", email));
  }
  if let Some(location) = &info.location {
    out.push_str(&format!("  location: {}\n", location));
  }
  out
}

fn blog_line(blog: &Blog) -> String {
  let published = blog
    .published_at
    .as_deref()
    .and_then(|at| at.get(..10))
    .unwrap_or("draft");
  format!(
    "{} [{}] {} ({} views) /blogs/{}",
    published, blog.category, blog.title, blog.view_count, blog.slug
  )
}

fn render_blog(blog: &Blog) -> String {
  let mut out = format!("{}\n{}\n", blog.title, "=".repeat(blog.title.chars().count()));
  out.push_str(&format!("{} | {} views", blog.category, blog.view_count));
  if let Some(minutes) = blog.reading_time {
    out.push_str(&format!(" | {} min read", minutes));
  }
  out.push_str("\n\n");
  out.push_str(&blog.content);
  out.push('\n');
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands;
  use crate::config::{ApiConfig, RenderContext};
  use httpmock::MockServer;
  use serde_json::json;

  fn app(server: &MockServer) -> App {
    let config = Config {
      api: ApiConfig {
        url: server.url("/api"),
        timeout_secs: 5,
      },
      ..Default::default()
    };
    let client = ApiClient::with_api_key(&config.api, RenderContext::Browser, None).unwrap();
    App::with_client(config, client)
  }

  fn envelope(data: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "message": "ok", "data": data, "timestamp": "t" })
  }

  #[tokio::test]
  async fn test_revisiting_page_uses_loaded_data() {
    let server = MockServer::start_async().await;
    let skills = server
      .mock_async(|when, then| {
        when.method("GET").path("/api/skills");
        then.status(200).json_body(envelope(json!([
          { "id": "1", "name": "Rust", "proficiency": 90, "displayOrder": 1 }
        ])));
      })
      .await;

    let app = app(&server);
    let page = commands::resolve("skills").unwrap();

    let first = app.show_page(page, false).await;
    let second = app.show_page(page, false).await;

    assert_eq!(skills.hits_async().await, 1);
    assert!(first.contains("Rust (90%)"));
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn test_refresh_refetches() {
    let server = MockServer::start_async().await;
    let skills = server
      .mock_async(|when, then| {
        when.method("GET").path("/api/skills");
        then.status(200).json_body(envelope(json!([])));
      })
      .await;

    let app = app(&server);
    let page = commands::resolve("skills").unwrap();
    app.load_page(page, true).await;
    app.load_page(page, true).await;

    assert_eq!(skills.hits_async().await, 2);
  }

  #[tokio::test]
  async fn test_failed_page_shows_resource_message() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/api/certifications");
        then.status(500);
      })
      .await;

    let app = app(&server);
    let page = commands::resolve("certifications").unwrap();
    let text = app.show_page(page, false).await;

    assert!(text.contains("Certification data is temporarily unavailable"));
  }

  #[tokio::test]
  async fn test_missing_blog_redirects() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/api/blogs/published/nope");
        then.status(404);
      })
      .await;

    let app = app(&server);
    assert!(matches!(app.open_blog("nope").await, BlogView::Redirect(_)));
  }

  #[tokio::test]
  async fn test_unavailable_blog_is_not_a_redirect() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/api/blogs/published/flaky");
        then.status(503);
      })
      .await;

    let app = app(&server);
    assert!(matches!(app.open_blog("flaky").await, BlogView::Unavailable(_)));
  }

  #[tokio::test]
  async fn test_opening_blog_waits_for_view_count() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("GET").path("/api/blogs/published/hello");
        then.status(200).json_body(envelope(json!({
          "id": "b1",
          "title": "Hello",
          "content": "Body text",
          "slug": "hello",
          "viewCount": 4,
          "status": "PUBLISHED",
          "createdAt": "2024-05-01T10:00:00Z",
          "updatedAt": "2024-05-01T10:00:00Z",
          "isActive": true,
          "category": "LIFE"
        })));
      })
      .await;
    let views = server
      .mock_async(|when, then| {
        when.method("POST").path("/api/blogs/b1/view");
        then.status(200).json_body(envelope(json!(null)));
      })
      .await;

    let app = app(&server);
    let view = app.open_blog("hello").await;

    // The view request has landed by the time the post is returned
    assert_eq!(views.hits_async().await, 1);
    match view {
      BlogView::Found(text) => assert!(text.contains("Body text")),
      other => panic!("expected the post, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_contact_rejection_is_an_error() {
    let server = MockServer::start_async().await;
    let app = app(&server);
    let form = ContactForm {
      name: "Ada".to_string(),
      email: "nope".to_string(),
      subject: None,
      message: "A long enough message".to_string(),
    };

    let err = app.send_contact(&form).await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid email address");
  }

  #[tokio::test]
  async fn test_contact_success_returns_server_message() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method("POST").path("/api/contact");
        then
          .status(200)
          .json_body(envelope(json!({ "success": true, "message": "Thanks!" })));
      })
      .await;

    let app = app(&server);
    let form = ContactForm {
      name: "Ada".to_string(),
      email: "ada@example.com".to_string(),
      subject: None,
      message: "A long enough message".to_string(),
    };

    assert_eq!(app.send_contact(&form).await.unwrap(), "Thanks!");
  }

  #[tokio::test]
  async fn test_status_report_lists_every_resource() {
    let server = MockServer::start_async().await;
    let app = app(&server);

    let report = app.status_report();
    assert_eq!(report.lines().count(), ResourceKind::ALL.len() + 1);
    assert!(report.contains("portfolio"));
    assert!(report.contains("never"));
  }
}
