//! Caching implementations for content types.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::cache::Cacheable;

use super::types::{
  Blog, Certification, Education, Experience, MonthYear, PersonalInfo, Project, Skill,
};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Blog {
  fn cache_key(&self) -> String {
    self.slug.clone()
  }

  // Detail lookups may return a post whose slug changed since the list was fetched
  fn same_entity(&self, other: &Self) -> bool {
    self.id == other.id || self.slug == other.slug
  }
}

impl Cacheable for Experience {
  fn cache_key(&self) -> String {
    self.id.clone()
  }
}

impl Cacheable for Project {
  fn cache_key(&self) -> String {
    self.id.clone()
  }
}

impl Cacheable for Skill {
  fn cache_key(&self) -> String {
    self.id.clone()
  }
}

impl Cacheable for Education {
  fn cache_key(&self) -> String {
    self.id.clone()
  }
}

impl Cacheable for Certification {
  fn cache_key(&self) -> String {
    self.id.clone()
  }
}

impl Cacheable for PersonalInfo {
  // There is only ever one profile
  fn cache_key(&self) -> String {
    self.id.clone().unwrap_or_else(|| "profile".to_string())
  }
}

// ============================================================================
// Display order
// ============================================================================

/// Highest `displayOrder` first; missing counts as 0.
pub fn experience_order(a: &Experience, b: &Experience) -> Ordering {
  b.display_order
    .unwrap_or(0)
    .cmp(&a.display_order.unwrap_or(0))
}

/// Highest `displayOrder` first; missing counts as 0.
pub fn project_order(a: &Project, b: &Project) -> Ordering {
  b.display_order
    .unwrap_or(0)
    .cmp(&a.display_order.unwrap_or(0))
}

/// Lowest `displayOrder` first; missing counts as 0.
pub fn skill_order(a: &Skill, b: &Skill) -> Ordering {
  a.display_order
    .unwrap_or(0)
    .cmp(&b.display_order.unwrap_or(0))
}

/// Most recent effective date first; undated entries last.
pub fn education_order(a: &Education, b: &Education) -> Ordering {
  newest_first(a.effective_date(), b.effective_date())
}

/// Most recently issued first; undated entries last.
pub fn certification_order(a: &Certification, b: &Certification) -> Ordering {
  newest_first(a.issued(), b.issued())
}

fn newest_first(a: Option<MonthYear>, b: Option<MonthYear>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => b.cmp(&a),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

// ============================================================================
// Resource keys
// ============================================================================

/// Every cached resource, used to address caches in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
  Blogs,
  Experiences,
  Projects,
  Skills,
  Education,
  Certifications,
  PortfolioInfo,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 7] = [
    ResourceKind::PortfolioInfo,
    ResourceKind::Experiences,
    ResourceKind::Projects,
    ResourceKind::Skills,
    ResourceKind::Education,
    ResourceKind::Certifications,
    ResourceKind::Blogs,
  ];

  /// Name used in logs and on the command line
  pub fn name(&self) -> &'static str {
    match self {
      ResourceKind::Blogs => "blogs",
      ResourceKind::Experiences => "experiences",
      ResourceKind::Projects => "projects",
      ResourceKind::Skills => "skills",
      ResourceKind::Education => "education",
      ResourceKind::Certifications => "certifications",
      ResourceKind::PortfolioInfo => "portfolio",
    }
  }

  /// Label used in user-facing messages
  pub fn label(&self) -> &'static str {
    match self {
      ResourceKind::Blogs => "Blog",
      ResourceKind::Experiences => "Experience",
      ResourceKind::Projects => "Project",
      ResourceKind::Skills => "Skills",
      ResourceKind::Education => "Education",
      ResourceKind::Certifications => "Certification",
      ResourceKind::PortfolioInfo => "Profile",
    }
  }

  /// API path segments of the collection endpoint
  pub fn endpoint(&self) -> &'static [&'static str] {
    match self {
      ResourceKind::Blogs => &["blogs", "published"],
      ResourceKind::Experiences => &["experiences"],
      ResourceKind::Projects => &["projects"],
      ResourceKind::Skills => &["skills"],
      ResourceKind::Education => &["educations"],
      ResourceKind::Certifications => &["certifications"],
      ResourceKind::PortfolioInfo => &["portfolio"],
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ResourceKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let needle = s.trim().to_lowercase();
    ResourceKind::ALL
      .into_iter()
      .find(|kind| kind.name() == needle)
      .ok_or_else(|| format!("unknown resource '{}'", s))
  }
}
