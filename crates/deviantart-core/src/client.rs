use std::sync::Arc;

use reqwest::{Client, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::auth::{AuthError, Authenticator, TokenSource};
use crate::config::{ClientConfig, ConfigError, RateLimitConfig};
use crate::models::StatusResponse;
use crate::services::{
    BrowseService, DeviationService, GalleryService, MessagesService, StashService, UserService,
};
use crate::transport::{BearerSender, RateLimitedTransport, TransportError};

/// Errors returned by API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("API error: {0}")]
    Api(ApiError),
    #[error("HTTP status {status} body: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// The API kept answering 429 until the retry budget ran out.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Transport(TransportError::MaxRetriesExceeded { .. }) => true,
            Self::Api(err) => err.http_status == StatusCode::TOO_MANY_REQUESTS.as_u16(),
            Self::HttpStatus { status, .. } => *status == StatusCode::TOO_MANY_REQUESTS,
            _ => false,
        }
    }

    /// The token was missing, rejected or could not be renewed.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Auth(_) | Self::Transport(TransportError::Auth(_)) => true,
            Self::Api(err) => {
                err.http_status == StatusCode::UNAUTHORIZED.as_u16()
                    || err.error == "invalid_token"
            }
            Self::HttpStatus { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }
}

/// Error envelope the API returns alongside non-2xx statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Error)]
#[error("{error}: {error_description}")]
pub struct ApiError {
    pub error: String,
    #[serde(default)]
    pub error_description: String,
    #[serde(default, alias = "code", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// HTTP status of the response that carried this envelope.
    #[serde(skip)]
    pub http_status: u16,
}

/// Typed client for the DeviantArt REST API.
///
/// Cheap to clone; every clone shares the same connection pool, token source
/// and retry policy. Service objects returned by the accessors hold a clone.
#[derive(Clone)]
pub struct DeviantArtClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    transport: RateLimitedTransport<BearerSender>,
    base_url: Url,
    cancel: CancellationToken,
}

impl DeviantArtClient {
    /// Client with default settings authorized by `tokens`.
    pub fn new(tokens: impl TokenSource + 'static) -> ClientResult<Self> {
        Self::builder().build(tokens)
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn from_token_source(
        tokens: Arc<dyn TokenSource>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        Self::assemble(tokens, config, CancellationToken::new())
    }

    /// Run `authenticator` and build a client on top of the resulting tokens.
    ///
    /// `cancel` only bounds the login itself. The returned client is not tied
    /// to it, so cancelling afterwards leaves API calls working. Use
    /// [`ClientBuilder::cancellation`] for a token that stops retry backoffs.
    pub async fn authenticate(
        authenticator: &Authenticator,
        config: ClientConfig,
        cancel: &CancellationToken,
    ) -> ClientResult<Self> {
        // Settings are checked before the token round trip.
        config.validate()?;
        let tokens = authenticator.authenticate(cancel).await?;
        Self::from_validated(Arc::new(tokens), config, CancellationToken::new())
    }

    fn assemble(
        tokens: Arc<dyn TokenSource>,
        config: ClientConfig,
        cancel: CancellationToken,
    ) -> ClientResult<Self> {
        config.validate()?;
        Self::from_validated(tokens, config, cancel)
    }

    fn from_validated(
        tokens: Arc<dyn TokenSource>,
        config: ClientConfig,
        cancel: CancellationToken,
    ) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        let transport = RateLimitedTransport::from_validated(
            BearerSender::new(http.clone(), tokens),
            config.rate_limit,
        );
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                transport,
                base_url: config.base_url,
                cancel,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn rate_limit(&self) -> &RateLimitConfig {
        self.inner.transport.config()
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.clone())
    }

    pub fn browse(&self) -> BrowseService {
        BrowseService::new(self.clone())
    }

    pub fn gallery(&self) -> GalleryService {
        GalleryService::new(self.clone())
    }

    pub fn deviation(&self) -> DeviationService {
        DeviationService::new(self.clone())
    }

    pub fn stash(&self) -> StashService {
        StashService::new(self.clone())
    }

    pub fn messages(&self) -> MessagesService {
        MessagesService::new(self.clone())
    }

    /// Confirm the current access token is accepted.
    pub async fn placebo(&self) -> ClientResult<bool> {
        let response: StatusResponse = self.get("placebo", &()).await?;
        Ok(response.is_success())
    }

    /// Resolve a path relative to the API root, e.g. `"browse/newest"`.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Build an endpoint URL from raw segments, percent-encoding each one.
    /// Use this when a segment comes from user input (usernames, IDs).
    pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::BaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `path` with `query` serialized into the query string.
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.get_url(self.url(path)?, query).await
    }

    pub async fn get_url<T, Q>(&self, url: Url, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.inner.http.get(url).query(query).build()?;
        self.execute(request).await
    }

    /// POST `form` as `application/x-www-form-urlencoded` to `path`.
    pub async fn post_form<T, F>(&self, path: &str, form: &F) -> ClientResult<T>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let request = self.inner.http.post(self.url(path)?).form(form).build()?;
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> ClientResult<T> {
        debug!(method = %request.method(), path = request.url().path(), "sending API request");
        let response = self
            .inner
            .transport
            .execute_with_cancel(request, &self.inner.cancel)
            .await?;
        decode(response).await
    }
}

impl std::fmt::Debug for DeviantArtClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviantArtClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!(%status, bytes = body.len(), "API response received");

    if status.is_success() {
        // Some endpoints acknowledge with an empty body.
        let payload = if body.trim().is_empty() { "null" } else { &body };
        return Ok(serde_json::from_str(payload)?);
    }

    match serde_json::from_str::<ApiError>(&body) {
        Ok(mut api) if !api.error.is_empty() => {
            api.http_status = status.as_u16();
            Err(ClientError::Api(api))
        }
        _ => Err(ClientError::HttpStatus { status, body }),
    }
}

/// Builder for [`DeviantArtClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    base_url: Option<String>,
    cancel: Option<CancellationToken>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.with_user_agent(user_agent);
        self
    }

    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config = self.config.with_rate_limit(rate_limit);
        self
    }

    /// Token whose cancellation aborts in-flight retry backoffs.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn build(self, tokens: impl TokenSource + 'static) -> ClientResult<DeviantArtClient> {
        self.build_with_source(Arc::new(tokens))
    }

    pub fn build_with_source(self, tokens: Arc<dyn TokenSource>) -> ClientResult<DeviantArtClient> {
        let config = match self.base_url {
            Some(base_url) => self.config.with_base_url(&base_url)?,
            None => self.config,
        };
        DeviantArtClient::assemble(tokens, config, self.cancel.unwrap_or_else(CancellationToken::new))
    }
}
