//! Contact form submission with transient success and error state.

use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::TIMEOUT_MESSAGE;
use crate::error::ApiError;

use super::client::{ApiClient, RequestScope};
use super::types::{ContactForm, ContactResponse};

/// Shown when a submission fails without a message from the server
pub const SEND_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";

const SENT_MESSAGE: &str = "Message sent successfully!";

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
});

/// Observable state of the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactState {
  pub loading: bool,
  pub success: bool,
  pub error: Option<String>,
}

impl ContactForm {
  /// Check field lengths and email shape before anything is sent.
  pub fn validate(&self) -> Result<(), ApiError> {
    let name = self.name.trim();
    if name.chars().count() < 2 {
      return Err(invalid("Name must be at least 2 characters"));
    }
    if name.chars().count() > 100 {
      return Err(invalid("Name must be at most 100 characters"));
    }

    let email = self.email.trim();
    if email.is_empty() {
      return Err(invalid("Email is required"));
    }
    let well_formed = EMAIL_PATTERN
      .as_ref()
      .is_some_and(|pattern| pattern.is_match(email));
    if email.len() > 255 || !well_formed {
      return Err(invalid("Please enter a valid email address"));
    }

    if let Some(subject) = &self.subject {
      if subject.chars().count() > 200 {
        return Err(invalid("Subject must be at most 200 characters"));
      }
    }

    let message = self.message.trim();
    if message.chars().count() < 10 {
      return Err(invalid("Message must be at least 10 characters"));
    }
    if message.chars().count() > 2000 {
      return Err(invalid("Message must be at most 2000 characters"));
    }

    Ok(())
  }
}

fn invalid(msg: &str) -> ApiError {
  ApiError::Validation(msg.to_string())
}

/// Sends contact form submissions.
///
/// A successful submission raises `success` and lowers it again after the
/// reset delay, so the next attempt starts from a clean form.
#[derive(Clone)]
pub struct ContactService {
  client: ApiClient,
  state: Arc<watch::Sender<ContactState>>,
  /// Bumped on every submission; stale reset timers check it
  submissions: Arc<AtomicU64>,
  reset_after: Duration,
}

impl ContactService {
  pub fn new(client: ApiClient, reset_after: Duration) -> Self {
    let (state, _) = watch::channel(ContactState::default());
    Self {
      client,
      state: Arc::new(state),
      submissions: Arc::new(AtomicU64::new(0)),
      reset_after,
    }
  }

  pub fn state(&self) -> ContactState {
    self.state.borrow().clone()
  }

  /// Submit the form. Never fails; the outcome lands in the state and the
  /// returned response. There is no automatic retry.
  pub async fn submit(&self, form: &ContactForm) -> ContactResponse {
    let submission = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;

    if let Err(err) = form.validate() {
      let message = err.describe();
      self.state.send_modify(|s| {
        s.loading = false;
        s.success = false;
        s.error = Some(message.clone());
      });
      return ContactResponse {
        success: false,
        message,
      };
    }

    let _sending = Sending::start(&self.state);

    let result = self
      .client
      .post::<_, ContactResponse>(&["contact"], form, RequestScope::Public)
      .await;

    match result {
      Ok(envelope) => {
        self.state.send_modify(|s| {
          s.success = true;
          s.error = None;
          s.loading = false;
        });
        debug!("contact form sent");
        self.schedule_reset(submission);
        envelope.data.unwrap_or_else(|| ContactResponse {
          success: true,
          message: SENT_MESSAGE.to_string(),
        })
      }
      Err(err) => {
        warn!(code = err.code(), error = %err, "contact form submission failed");
        let message = failure_message(&err);
        self.state.send_modify(|s| {
          s.success = false;
          s.error = Some(message.clone());
          s.loading = false;
        });
        ContactResponse {
          success: false,
          message,
        }
      }
    }
  }

  fn schedule_reset(&self, submission: u64) {
    let state = Arc::clone(&self.state);
    let submissions = Arc::clone(&self.submissions);
    let deadline = tokio::time::Instant::now() + self.reset_after;

    tokio::spawn(async move {
      tokio::time::sleep_until(deadline).await;
      // A newer submission owns the state now
      if submissions.load(Ordering::SeqCst) != submission {
        return;
      }
      state.send_if_modified(|s| {
        if s.success {
          s.success = false;
          true
        } else {
          false
        }
      });
    });
  }
}

/// Marks a submission in flight and lowers `loading` on drop, so a
/// submission abandoned mid-request does not leave the form stuck.
struct Sending<'a> {
  state: &'a watch::Sender<ContactState>,
}

impl<'a> Sending<'a> {
  fn start(state: &'a watch::Sender<ContactState>) -> Self {
    state.send_modify(|s| {
      s.loading = true;
      s.success = false;
      s.error = None;
    });
    Self { state }
  }
}

impl Drop for Sending<'_> {
  fn drop(&mut self) {
    self.state.send_if_modified(|s| {
      if s.loading {
        s.loading = false;
        true
      } else {
        false
      }
    });
  }
}

fn failure_message(err: &ApiError) -> String {
  if let Some(message) = err.server_message() {
    return message.to_string();
  }
  if err.is_timeout() {
    TIMEOUT_MESSAGE.to_string()
  } else {
    SEND_FAILED_MESSAGE.to_string()
  }
}
