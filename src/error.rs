//! Error taxonomy for requests against the content API.

use thiserror::Error;

/// Failure of a single API request, classified so callers can pick a recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// The request did not complete within the client timeout
  #[error("request timed out")]
  Timeout,
  /// The backend answered 404
  #[error("resource not found")]
  NotFound,
  /// The request never produced an HTTP response (DNS, connect, TLS, ...)
  #[error("transport error: {0}")]
  Transport(String),
  /// Non-2xx status other than 404, or an envelope with `success: false`
  #[error("server error {status}: {}", message.as_deref().unwrap_or("no message"))]
  Server {
    status: u16,
    message: Option<String>,
  },
  /// Input rejected before it was sent
  #[error("validation error: {0}")]
  Validation(String),
  /// The body could not be decoded as the expected envelope
  #[error("failed to decode response: {0}")]
  Decode(String),
}

impl ApiError {
  /// Stable machine-readable code for this error.
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::Timeout => "TIMEOUT",
      ApiError::NotFound => "NOT_FOUND",
      ApiError::Transport(_) => "CLIENT_ERROR",
      ApiError::Server { status, .. } => match status {
        400 => "BAD_REQUEST",
        401 => "UNAUTHORIZED",
        403 => "FORBIDDEN",
        422 => "VALIDATION_ERROR",
        429 => "RATE_LIMITED",
        500 => "SERVER_ERROR",
        502 => "BAD_GATEWAY",
        503 => "SERVICE_UNAVAILABLE",
        504 => "GATEWAY_TIMEOUT",
        _ => "HTTP_ERROR",
      },
      ApiError::Validation(_) => "VALIDATION_ERROR",
      ApiError::Decode(_) => "DECODE_ERROR",
    }
  }

  /// Human readable description, suitable for logs and error pages.
  pub fn describe(&self) -> String {
    match self {
      ApiError::Timeout => "Request timed out".to_string(),
      ApiError::NotFound => "Resource not found".to_string(),
      ApiError::Transport(msg) => format!("Client Error: {}", msg),
      ApiError::Server { status, .. } => match status {
        400 => "Bad Request - Please check your input".to_string(),
        401 => "Unauthorized - Please log in".to_string(),
        403 => "Forbidden - Access denied".to_string(),
        422 => "Validation Error - Please check your input".to_string(),
        429 => "Too Many Requests - Please try again later".to_string(),
        500 => "Internal Server Error - Please try again later".to_string(),
        502 => "Bad Gateway - Service temporarily unavailable".to_string(),
        503 => "Service Unavailable - Please try again later".to_string(),
        504 => "Gateway Timeout - Please try again later".to_string(),
        other => format!("Server Error: {}", other),
      },
      ApiError::Validation(msg) => msg.clone(),
      ApiError::Decode(msg) => format!("Unexpected response: {}", msg),
    }
  }

  /// Message supplied by the backend, if the error carried one.
  pub fn server_message(&self) -> Option<&str> {
    match self {
      ApiError::Server { message, .. } => message.as_deref().filter(|m| !m.trim().is_empty()),
      ApiError::Validation(msg) => Some(msg),
      _ => None,
    }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, ApiError::Timeout)
  }

}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      ApiError::Timeout
    } else if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else {
      ApiError::Transport(err.to_string())
    }
  }
}
