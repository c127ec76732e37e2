//! Serde-deserializable types matching the content API's wire format.

use serde::Deserialize;

/// Standard wrapper around every API response body.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default = "default_success")]
  pub success: bool,
  #[serde(default)]
  pub message: String,
  pub data: Option<T>,
  #[serde(default)]
  pub timestamp: String,
  pub path: Option<String>,
  pub status: Option<u16>,
}

impl<T> ApiEnvelope<T> {
  /// The message, if the backend sent a non-blank one.
  pub fn message(&self) -> Option<&str> {
    Some(self.message.as_str()).filter(|m| !m.trim().is_empty())
  }
}

/// Error bodies only need the message; `data` may hold anything.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}

fn default_success() -> bool {
  true
}
