use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the key sent as `X-API-Key` on admin requests.
pub const API_KEY_ENV: &str = "API_SERVER_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Where the client runs: `browser` or `server` (pre-render)
  #[serde(default)]
  pub render_context: RenderContext,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub contact: ContactConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
  /// Verbose logging and debug output
  #[serde(default)]
  pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the content API, including any path prefix
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Per-request timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderContext {
  /// Interactive client; side effects such as view counting are allowed
  #[default]
  Browser,
  /// Server-side pre-render; no view counting, may send the API key
  Server,
}

impl RenderContext {
  pub fn is_browser(&self) -> bool {
    matches!(self, RenderContext::Browser)
  }

  pub fn is_server(&self) -> bool {
    matches!(self, RenderContext::Server)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Freshness window for every resource except blogs
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
  /// Freshness window for the blog listing
  #[serde(default = "default_blog_ttl_secs")]
  pub blog_ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
      blog_ttl_secs: default_blog_ttl_secs(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.ttl_secs as i64)
  }

  pub fn blog_ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.blog_ttl_secs as i64)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
  /// How long the success banner stays up after a submission
  #[serde(default = "default_success_reset_ms")]
  pub success_reset_ms: u64,
}

impl Default for ContactConfig {
  fn default() -> Self {
    Self {
      success_reset_ms: default_success_reset_ms(),
    }
  }
}

impl ContactConfig {
  pub fn success_reset(&self) -> Duration {
    Duration::from_millis(self.success_reset_ms)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// tracing filter directive (RUST_LOG takes precedence)
  pub filter: Option<String>,
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

/// Longest freshness window accepted for any cache (one year)
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest the contact success banner may stay up (one day)
const MAX_SUCCESS_RESET_MS: u64 = 24 * 60 * 60 * 1000;

fn default_api_url() -> String {
  "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
  15
}

fn default_ttl_secs() -> u64 {
  10 * 60
}

fn default_blog_ttl_secs() -> u64 {
  5 * 60
}

fn default_success_reset_ms() -> u64 {
  3000
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./folio.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/folio/config.yaml
  ///
  /// Without a config file the built-in defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("folio.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("folio").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be greater than zero"));
    }
    url::Url::parse(&config.api.url)
      .map_err(|e| eyre!("api.url '{}' is not a valid URL: {}", config.api.url, e))?;
    for (field, secs) in [
      ("cache.ttl_secs", config.cache.ttl_secs),
      ("cache.blog_ttl_secs", config.cache.blog_ttl_secs),
    ] {
      if secs > MAX_TTL_SECS {
        return Err(eyre!("{} must be at most {} seconds", field, MAX_TTL_SECS));
      }
    }
    if config.contact.success_reset_ms > MAX_SUCCESS_RESET_MS {
      return Err(eyre!(
        "contact.success_reset_ms must be at most {}",
        MAX_SUCCESS_RESET_MS
      ));
    }
    Ok(config)
  }

  /// Get the API key for admin-scoped server requests.
  ///
  /// Reads API_SERVER_KEY; absent or blank means no key is sent.
  pub fn get_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV)
      .ok()
      .map(|key| key.trim().to_string())
      .filter(|key| !key.is_empty())
  }
}
