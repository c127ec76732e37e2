//! Content records as served by the portfolio API.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A published blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub content: String,
  pub slug: String,
  pub excerpt: Option<String>,
  pub featured_image: Option<String>,
  /// Minutes
  pub reading_time: Option<u32>,
  #[serde(default)]
  pub view_count: u64,
  pub status: BlogStatus,
  pub published_at: Option<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub category: BlogCategory,
}

impl Blog {
  /// Publication time as epoch milliseconds, 0 when missing or unparseable.
  pub fn published_at_millis(&self) -> i64 {
    self
      .published_at
      .as_deref()
      .and_then(parse_timestamp_millis)
      .unwrap_or(0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlogStatus {
  Draft,
  Published,
  Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlogCategory {
  Technical,
  Life,
  Career,
}

impl BlogCategory {
  pub const ALL: [BlogCategory; 3] = [
    BlogCategory::Technical,
    BlogCategory::Life,
    BlogCategory::Career,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      BlogCategory::Technical => "TECHNICAL",
      BlogCategory::Life => "LIFE",
      BlogCategory::Career => "CAREER",
    }
  }
}

impl fmt::Display for BlogCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BlogCategory {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    BlogCategory::ALL
      .into_iter()
      .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown blog category '{}'", s))
  }
}

/// A position held, shown on the experience page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
  pub id: String,
  pub company_name: String,
  pub position: String,
  pub location: Option<String>,
  /// MM-YYYY
  pub start_date: String,
  pub end_date: Option<String>,
  #[serde(default)]
  pub is_current: bool,
  #[serde(default)]
  pub description: Vec<String>,
  pub technologies: Option<Vec<String>>,
  pub achievements: Option<Vec<String>>,
  pub company_logo: Option<String>,
  pub company_website: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub short_description: Option<String>,
  pub featured_image: Option<String>,
  pub technologies: Option<Vec<String>>,
  pub project_url: Option<String>,
  pub github_url: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
  #[serde(default = "default_true")]
  pub is_active: bool,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
  pub id: String,
  pub name: String,
  pub category: Option<String>,
  pub proficiency: Option<u8>,
  pub icon: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
  pub id: String,
  pub degree: String,
  pub field_of_study: String,
  pub institution_name: String,
  pub location: Option<String>,
  /// MM-YYYY
  pub start_date: String,
  pub end_date: Option<String>,
  #[serde(default)]
  pub is_current: bool,
  pub description: Option<String>,
  pub institution_logo: Option<String>,
  pub institution_website: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub display_order: Option<i32>,
}

impl Education {
  /// Date used for ordering: the start date while ongoing, else the end date.
  pub fn effective_date(&self) -> Option<MonthYear> {
    let raw = match (&self.end_date, self.is_current) {
      (Some(end), false) if !end.trim().is_empty() => end,
      _ => &self.start_date,
    };
    raw.parse().ok()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
  pub id: String,
  pub certification_name: String,
  pub issuing_organization: String,
  /// MM-YYYY
  pub issue_date: Option<String>,
  pub expiration_date: Option<String>,
  #[serde(default)]
  pub does_not_expire: bool,
  pub credential_id: Option<String>,
  pub credential_url: Option<String>,
  pub description: Option<String>,
  pub organization_logo: Option<String>,
  pub organization_website: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
  pub display_order: Option<i32>,
}

impl Certification {
  pub fn issued(&self) -> Option<MonthYear> {
    self.issue_date.as_deref().and_then(|d| d.parse().ok())
  }
}

/// Site owner profile shown on the home and about pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
  pub id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub tagline: String,
  #[serde(default)]
  pub description: Vec<String>,
  #[serde(default)]
  pub profile_image: String,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub location: Option<String>,
  pub social_links: Option<SocialLinks>,
  pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
  pub github: Option<String>,
  pub linkedin: Option<String>,
  pub twitter: Option<String>,
  pub website: Option<String>,
}

/// Contact form payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
  pub name: String,
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactResponse {
  pub success: bool,
  pub message: String,
}

/// A `MM-YYYY` calendar month.
///
/// Ordering is chronological (year first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
  pub year: i32,
  pub month: u32,
}

impl FromStr for MonthYear {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (month, year) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| format!("expected MM-YYYY, got '{}'", s))?;
    let month: u32 = month
      .parse()
      .map_err(|_| format!("invalid month in '{}'", s))?;
    let year: i32 = year
      .parse()
      .map_err(|_| format!("invalid year in '{}'", s))?;
    if !(1..=12).contains(&month) {
      return Err(format!("month out of range in '{}'", s));
    }
    Ok(MonthYear { year, month })
  }
}

impl fmt::Display for MonthYear {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}-{:04}", self.month, self.year)
  }
}

/// Parse an API timestamp (RFC 3339, or a zone-less ISO local date-time
/// taken as UTC) into epoch milliseconds.
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.timestamp_millis());
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .map(|dt| dt.and_utc().timestamp_millis())
}

fn default_true() -> bool {
  true
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_month_year_parse() {
    let date: MonthYear = "03-2021".parse().unwrap();
    assert_eq!(date, MonthYear { year: 2021, month: 3 });
    assert_eq!(date.to_string(), "03-2021");

    assert!("13-2021".parse::<MonthYear>().is_err());
    assert!("2021".parse::<MonthYear>().is_err());
    assert!("ab-2021".parse::<MonthYear>().is_err());
  }

  #[test]
  fn test_month_year_ordering() {
    let a: MonthYear = "12-2020".parse().unwrap();
    let b: MonthYear = "01-2021".parse().unwrap();
    assert!(a < b);
  }

  #[test]
  fn test_parse_timestamps() {
    assert_eq!(parse_timestamp_millis("1970-01-01T00:00:01Z"), Some(1000));
    assert_eq!(
      parse_timestamp_millis("1970-01-01T00:00:02.500"),
      Some(2500)
    );
    assert_eq!(parse_timestamp_millis("yesterday"), None);
  }

  #[test]
  fn test_blog_deserialize() {
    let json = r#"{
      "id": "b1",
      "title": "Hello",
      "content": "<p>Hi</p>",
      "slug": "hello",
      "viewCount": 4,
      "status": "PUBLISHED",
      "publishedAt": "2024-05-01T10:00:00Z",
      "createdAt": "2024-05-01T09:00:00Z",
      "updatedAt": "2024-05-01T09:00:00Z",
      "isActive": true,
      "category": "LIFE"
    }"#;
    let blog: Blog = serde_json::from_str(json).unwrap();
    assert_eq!(blog.category, BlogCategory::Life);
    assert_eq!(blog.reading_time, None);
    assert!(blog.published_at_millis() > 0);
  }

  #[test]
  fn test_category_from_str() {
    assert_eq!("life".parse::<BlogCategory>(), Ok(BlogCategory::Life));
    assert!("travel".parse::<BlogCategory>().is_err());
  }

  #[test]
  fn test_education_effective_date() {
    let mut edu = Education {
      id: "e1".into(),
      degree: "BSc".into(),
      field_of_study: "CS".into(),
      institution_name: "Uni".into(),
      location: None,
      start_date: "08-2016".into(),
      end_date: Some("06-2020".into()),
      is_current: false,
      description: None,
      institution_logo: None,
      institution_website: None,
      created_at: None,
      updated_at: None,
      display_order: None,
    };
    assert_eq!(edu.effective_date().unwrap().to_string(), "06-2020");

    edu.is_current = true;
    assert_eq!(edu.effective_date().unwrap().to_string(), "08-2016");
  }
}
