use crate::config::{ApiConfig, Config, RenderContext};
use crate::content::api_types::{ApiEnvelope, ApiErrorBody};
use crate::error::ApiError;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Who a request acts for; only admin requests may carry the API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
  Public,
  Admin,
}

/// Content API client wrapper
///
/// Every call is one HTTP request with a bounded timeout; the response
/// envelope is unwrapped and failures are classified into `ApiError`.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  timeout: Duration,
  context: RenderContext,
  api_key: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_api_key(&config.api, config.render_context, Config::get_api_key())
  }

  pub fn with_api_key(
    api: &ApiConfig,
    context: RenderContext,
    api_key: Option<String>,
  ) -> Result<Self> {
    let base = Url::parse(&api.url).map_err(|e| eyre!("Invalid API URL {}: {}", api.url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("API URL {} cannot be used as a base", api.url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      timeout: api.timeout(),
      context,
      api_key,
    })
  }

  pub fn context(&self) -> RenderContext {
    self.context
  }

  /// GET an endpoint and return the envelope's `data`, if any
  pub async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>, ApiError> {
    let envelope = self
      .send::<T, ()>(Method::GET, segments, None, RequestScope::Public)
      .await?;
    Ok(envelope.data)
  }

  /// GET a collection endpoint; a missing `data` is an empty collection
  pub async fn get_list<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>, ApiError> {
    Ok(self.get_data::<Vec<T>>(segments).await?.unwrap_or_default())
  }

  /// POST a JSON body and return the full envelope
  pub async fn post<B, T>(
    &self,
    segments: &[&str],
    body: &B,
    scope: RequestScope,
  ) -> Result<ApiEnvelope<T>, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    self.send(Method::POST, segments, Some(body), scope).await
  }

  /// Build the URL for an endpoint; each segment is percent-encoded.
  pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::Transport(format!("invalid base URL {}", self.base)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  /// Whether a request gets the `X-API-Key` header: server context,
  /// non-GET, admin scope, and a key configured.
  fn attaches_api_key(&self, method: &Method, scope: RequestScope) -> bool {
    self.api_key.is_some()
      && self.context.is_server()
      && *method != Method::GET
      && scope == RequestScope::Admin
  }

  async fn send<T, B>(
    &self,
    method: Method,
    segments: &[&str],
    body: Option<&B>,
    scope: RequestScope,
  ) -> Result<ApiEnvelope<T>, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let url = self.endpoint(segments)?;
    debug!(%method, %url, "api request");

    let mut req = self
      .http
      .request(method.clone(), url)
      .timeout(self.timeout);

    if self.attaches_api_key(&method, scope) {
      if let Some(key) = &self.api_key {
        req = req.header("X-API-Key", key);
      }
    }
    if let Some(b) = body {
      req = req.json(b);
    }

    let resp = req.send().await?;
    Self::handle(resp).await
  }

  async fn handle<T: DeserializeOwned>(resp: Response) -> Result<ApiEnvelope<T>, ApiError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if status == StatusCode::NOT_FOUND {
      return Err(ApiError::NotFound);
    }
    if !status.is_success() {
      let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message);
      return Err(ApiError::Server {
        status: status.as_u16(),
        message,
      });
    }

    let envelope: ApiEnvelope<T> =
      serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !envelope.success {
      return Err(ApiError::Server {
        status: envelope.status.unwrap_or(status.as_u16()),
        message: envelope.message().map(String::from),
      });
    }

    Ok(envelope)
  }
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("base", &self.base.as_str())
      .field("timeout", &self.timeout)
      .field("context", &self.context)
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}
