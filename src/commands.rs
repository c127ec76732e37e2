/// Site pages and page-name lookup

use crate::content::cache::ResourceKind;

#[derive(Debug, Clone)]
pub struct Page {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Resources the page renders
  pub resources: &'static [ResourceKind],
}

/// All pages of the site
pub const PAGES: &[Page] = &[
  Page {
    name: "home",
    aliases: &["h", "index"],
    description: "Profile summary and featured projects",
    resources: &[ResourceKind::PortfolioInfo, ResourceKind::Projects],
  },
  Page {
    name: "about-me",
    aliases: &["about", "a", "me"],
    description: "Profile, experience and skills at a glance",
    resources: &[
      ResourceKind::PortfolioInfo,
      ResourceKind::Experiences,
      ResourceKind::Skills,
    ],
  },
  Page {
    name: "experience",
    aliases: &["x", "work", "jobs"],
    description: "Positions held, most prominent first",
    resources: &[ResourceKind::Experiences],
  },
  Page {
    name: "education",
    aliases: &["edu", "school"],
    description: "Degrees and studies, most recent first",
    resources: &[ResourceKind::Education],
  },
  Page {
    name: "skills",
    aliases: &["s", "skill"],
    description: "Skills by display order",
    resources: &[ResourceKind::Skills],
  },
  Page {
    name: "projects",
    aliases: &["p", "project", "portfolio"],
    description: "Project showcase",
    resources: &[ResourceKind::Projects],
  },
  Page {
    name: "certifications",
    aliases: &["certs", "cert"],
    description: "Certifications, most recently issued first",
    resources: &[ResourceKind::Certifications],
  },
  Page {
    name: "blogs",
    aliases: &["b", "blog", "posts"],
    description: "Published blog posts",
    resources: &[ResourceKind::Blogs],
  },
  Page {
    name: "contact",
    aliases: &["c", "mail"],
    description: "Contact details and form",
    resources: &[ResourceKind::PortfolioInfo],
  },
];

/// Get page suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Page> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return PAGES.iter().collect();
  }

  let mut matches: Vec<(&Page, u32)> = Vec::new();

  for page in PAGES {
    // Exact match on name
    if page.name == input_lower {
      matches.push((page, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if page.aliases.contains(&input_lower.as_str()) {
      matches.push((page, 1));
      continue;
    }

    // Prefix match on name
    if page.name.starts_with(&input_lower) {
      matches.push((page, 2));
      continue;
    }

    // Prefix match on alias
    if page.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((page, 3));
      continue;
    }

    // Fuzzy match (contains)
    if page.name.contains(&input_lower) {
      matches.push((page, 4));
      continue;
    }

    // Fuzzy match on alias
    if page.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((page, 5));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(page, _)| page).collect()
}

/// Resolve input to a single page, if anything matches
pub fn resolve(input: &str) -> Option<&'static Page> {
  get_suggestions(input).into_iter().next()
}
