//! Blog listing filters: category, text search, and sorting.
//!
//! Pure functions over a snapshot of the blog cache; nothing here touches the
//! network.

use std::cmp::Ordering;
use std::str::FromStr;

use super::types::{Blog, BlogCategory};

/// Search terms shorter than this are ignored
pub const SEARCH_MIN_LENGTH: usize = 2;

/// Reading time used when a post has none
pub const DEFAULT_READING_TIME: u32 = 0;

/// Field to sort blogs by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogSortField {
  PublishedAt,
  ViewCount,
  ReadingTime,
}

impl BlogSortField {
  /// Numeric sort key for a blog
  fn key(&self, blog: &Blog) -> i64 {
    match self {
      BlogSortField::PublishedAt => blog.published_at_millis(),
      BlogSortField::ViewCount => blog.view_count as i64,
      BlogSortField::ReadingTime => blog.reading_time.unwrap_or(DEFAULT_READING_TIME) as i64,
    }
  }
}

impl FromStr for BlogSortField {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "publishedAt" | "published" => Ok(BlogSortField::PublishedAt),
      "viewCount" | "views" => Ok(BlogSortField::ViewCount),
      "readingTime" | "reading" => Ok(BlogSortField::ReadingTime),
      other => Err(format!("unknown sort field '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl FromStr for SortOrder {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "asc" => Ok(SortOrder::Asc),
      "desc" => Ok(SortOrder::Desc),
      other => Err(format!("unknown sort order '{}'", other)),
    }
  }
}

/// Filter settings for the blog listing. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilters {
  pub category: Option<BlogCategory>,
  pub search: Option<String>,
  pub sort_by: Option<BlogSortField>,
  /// Defaults to descending when `sort_by` is set
  pub sort_order: Option<SortOrder>,
}

impl BlogFilters {
  /// The search term, if it is long enough to apply.
  fn effective_search(&self) -> Option<String> {
    self
      .search
      .as_deref()
      .filter(|term| term.chars().count() >= SEARCH_MIN_LENGTH)
      .map(|term| term.to_lowercase())
  }
}

/// Apply `filters` to `blogs`, returning a new list.
pub fn filter_blogs(blogs: &[Blog], filters: &BlogFilters) -> Vec<Blog> {
  let search = filters.effective_search();

  let mut filtered: Vec<Blog> = blogs
    .iter()
    .filter(|blog| filters.category.map_or(true, |c| blog.category == c))
    .filter(|blog| search.as_deref().map_or(true, |term| matches_search(blog, term)))
    .cloned()
    .collect();

  if let Some(field) = filters.sort_by {
    let order = filters.sort_order.unwrap_or_default();
    // sort_by is stable, so equal keys keep their listing order
    filtered.sort_by(|a, b| compare_blogs(a, b, field, order));
  }

  filtered
}

fn matches_search(blog: &Blog, term: &str) -> bool {
  contains_ignore_case(&blog.title, term)
    || blog
      .excerpt
      .as_deref()
      .is_some_and(|excerpt| contains_ignore_case(excerpt, term))
    || contains_ignore_case(&blog.content, term)
}

/// `term` must already be lowercase
fn contains_ignore_case(text: &str, term: &str) -> bool {
  text.to_lowercase().contains(term)
}

fn compare_blogs(a: &Blog, b: &Blog, field: BlogSortField, order: SortOrder) -> Ordering {
  let (a, b) = (field.key(a), field.key(b));
  match order {
    SortOrder::Asc => a.cmp(&b),
    SortOrder::Desc => b.cmp(&a),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::content::types::BlogStatus;

  fn blog(
    slug: &str,
    category: BlogCategory,
    published_at: Option<&str>,
    views: u64,
    reading: Option<u32>,
  ) -> Blog {
    Blog {
      id: format!("id-{}", slug),
      title: format!("Post {}", slug),
      content: String::new(),
      slug: slug.to_string(),
      excerpt: None,
      featured_image: None,
      reading_time: reading,
      view_count: views,
      status: BlogStatus::Published,
      published_at: published_at.map(String::from),
      created_at: "2024-01-01T00:00:00Z".to_string(),
      updated_at: "2024-01-01T00:00:00Z".to_string(),
      is_active: true,
      category,
    }
  }

  fn test_blogs() -> Vec<Blog> {
    let mut rust = blog(
      "rust",
      BlogCategory::Technical,
      Some("2024-03-01T00:00:00Z"),
      50,
      Some(8),
    );
    rust.title = "Learning Rust".to_string();
    rust.excerpt = Some("Ownership and borrowing".to_string());

    let mut hike = blog(
      "hike",
      BlogCategory::Life,
      Some("2024-01-15T00:00:00Z"),
      10,
      None,
    );
    hike.content = "<p>A long walk in the HILLS</p>".to_string();

    let interview = blog("interview", BlogCategory::Career, None, 10, Some(4));
    let garden = blog(
      "garden",
      BlogCategory::Life,
      Some("2024-02-01T00:00:00Z"),
      30,
      Some(3),
    );

    vec![rust, hike, interview, garden]
  }

  fn slugs(blogs: &[Blog]) -> Vec<&str> {
    blogs.iter().map(|b| b.slug.as_str()).collect()
  }

  #[test]
  fn test_no_filters_is_identity() {
    let blogs = test_blogs();
    let result = filter_blogs(&blogs, &BlogFilters::default());
    assert_eq!(result, blogs);
  }

  #[test]
  fn test_short_search_is_ignored() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      search: Some("a".to_string()),
      ..Default::default()
    };
    assert_eq!(filter_blogs(&blogs, &filters), blogs);
  }

  #[test]
  fn test_category_filter_preserves_order() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      category: Some(BlogCategory::Life),
      ..Default::default()
    };
    let result = filter_blogs(&blogs, &filters);
    assert_eq!(slugs(&result), vec!["hike", "garden"]);
    assert!(result.iter().all(|b| b.category == BlogCategory::Life));
  }

  #[test]
  fn test_search_matches_title_excerpt_or_content() {
    let blogs = test_blogs();

    let by_title = BlogFilters {
      search: Some("RUST".to_string()),
      ..Default::default()
    };
    assert_eq!(slugs(&filter_blogs(&blogs, &by_title)), vec!["rust"]);

    let by_excerpt = BlogFilters {
      search: Some("borrow".to_string()),
      ..Default::default()
    };
    assert_eq!(slugs(&filter_blogs(&blogs, &by_excerpt)), vec!["rust"]);

    let by_content = BlogFilters {
      search: Some("hills".to_string()),
      ..Default::default()
    };
    assert_eq!(slugs(&filter_blogs(&blogs, &by_content)), vec!["hike"]);
  }

  #[test]
  fn test_sort_by_published_missing_is_epoch() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      sort_by: Some(BlogSortField::PublishedAt),
      ..Default::default()
    };
    assert_eq!(
      slugs(&filter_blogs(&blogs, &filters)),
      vec!["rust", "garden", "hike", "interview"]
    );
  }

  #[test]
  fn test_sort_by_views_ascending_is_stable() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      sort_by: Some(BlogSortField::ViewCount),
      sort_order: Some(SortOrder::Asc),
      ..Default::default()
    };
    // hike and interview tie on 10 views and keep listing order
    assert_eq!(
      slugs(&filter_blogs(&blogs, &filters)),
      vec!["hike", "interview", "garden", "rust"]
    );
  }

  #[test]
  fn test_sort_by_reading_time_missing_is_zero() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      sort_by: Some(BlogSortField::ReadingTime),
      sort_order: Some(SortOrder::Asc),
      ..Default::default()
    };
    assert_eq!(
      slugs(&filter_blogs(&blogs, &filters)),
      vec!["hike", "garden", "interview", "rust"]
    );
  }

  #[test]
  fn test_combined_filters() {
    let blogs = test_blogs();
    let filters = BlogFilters {
      category: Some(BlogCategory::Life),
      search: Some("post".to_string()),
      sort_by: Some(BlogSortField::ViewCount),
      sort_order: None,
    };
    assert_eq!(
      slugs(&filter_blogs(&blogs, &filters)),
      vec!["garden", "hike"]
    );
  }

  #[test]
  fn test_parse_sort_options() {
    assert_eq!(
      "viewCount".parse::<BlogSortField>(),
      Ok(BlogSortField::ViewCount)
    );
    assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
    assert!("sideways".parse::<SortOrder>().is_err());
    assert!("likes".parse::<BlogSortField>().is_err());
  }
}
