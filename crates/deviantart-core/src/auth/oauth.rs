use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::session::TokenResponse;
use super::{AuthError, AuthSession, StateToken};

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://www.deviantart.com/oauth2/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://www.deviantart.com/oauth2/token";
pub const DEFAULT_SCOPES: &[&str; 3] = &["basic", "stash", "publish"];

const DEFAULT_USER_AGENT: &str = concat!("deviantart-rs/", env!("CARGO_PKG_VERSION"));
const TOKEN_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// OAuth client configuration supplied by consumers.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    pub fn new<S: Into<String>>(client_id: S, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri,
            scopes: vec![],
        }
    }

    /// Configuration for the authorization code grant with the scopes needed
    /// to browse, manage Sta.sh and publish.
    pub fn authorization_code<I, S>(client_id: I, client_secret: S, redirect_uri: Url) -> Self
    where
        I: Into<String>,
        S: Into<String>,
    {
        Self::new(client_id, redirect_uri)
            .with_secret(client_secret)
            .with_scopes(DEFAULT_SCOPES.iter().copied())
    }

    pub fn with_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// Provider endpoints for the browser redirect and the token exchange.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub authorization_url: Url,
    pub token_url: Url,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorization_url: Url::parse(DEFAULT_AUTHORIZATION_URL)
                .expect("default authorization URL is valid"),
            token_url: Url::parse(DEFAULT_TOKEN_URL).expect("default token URL is valid"),
        }
    }
}

/// Bundles the results of a token exchange.
#[derive(Debug, Clone)]
pub struct TokenExchangeResult {
    pub session: AuthSession,
    pub received_at: DateTime<Utc>,
}

/// Performs OAuth2 token requests against the provider.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    config: OAuthConfig,
    endpoints: OAuthEndpoints,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Result<Self, AuthError> {
        Self::with_endpoints(config, OAuthEndpoints::default())
    }

    pub fn with_endpoints(
        config: OAuthConfig,
        endpoints: OAuthEndpoints,
    ) -> Result<Self, AuthError> {
        let http = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            config,
            endpoints,
        })
    }

    /// Clone the OAuth client while overriding the redirect URI.
    pub fn clone_with_redirect(&self, redirect_uri: Url) -> Self {
        let mut config = self.config.clone();
        config.redirect_uri = redirect_uri;
        Self {
            http: self.http.clone(),
            config,
            endpoints: self.endpoints.clone(),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &OAuthEndpoints {
        &self.endpoints
    }

    /// URL the user visits to grant consent.
    pub fn authorization_url(&self, state: &StateToken) -> Url {
        let mut url = self.endpoints.authorization_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("response_type", "code");
            pairs.append_pair("client_id", &self.config.client_id);
            pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());
            if !self.config.scopes.is_empty() {
                pairs.append_pair("scope", &self.config.scopes.join(" "));
            }
            pairs.append_pair("state", state.as_str());
        }
        url
    }

    /// Exchange an authorization code for access/refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResult, AuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_owned()),
            ("redirect_uri", self.config.redirect_uri.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];

        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        debug!(token_url = %self.endpoints.token_url, "exchanging authorization code");
        self.request_token(&form).await
    }

    /// Refresh an existing session using its refresh token.
    pub async fn refresh_session(
        &self,
        existing: &AuthSession,
    ) -> Result<TokenExchangeResult, AuthError> {
        let refresh_token = existing
            .refresh_token
            .as_ref()
            .ok_or(AuthError::RefreshUnavailable)?;

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.clone()),
            ("client_id", self.config.client_id.clone()),
        ];

        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        debug!(token_url = %self.endpoints.token_url, "refreshing access token");
        let mut token_result = self.request_token(&form).await?;

        token_result.session.inherit_refresh_token(existing);

        Ok(token_result)
    }

    /// Request client credentials (machine-to-machine) tokens.
    pub async fn client_credentials(
        &self,
        scopes: &[String],
    ) -> Result<TokenExchangeResult, AuthError> {
        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.config.client_id.clone()),
        ];

        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        if !scopes.is_empty() {
            form.push(("scope", scopes.join(" ")));
        }

        debug!(token_url = %self.endpoints.token_url, "requesting client credentials token");
        self.request_token(&form).await
    }

    async fn request_token(
        &self,
        form: &[(&str, String)],
    ) -> Result<TokenExchangeResult, AuthError> {
        let response = self
            .http
            .post(self.endpoints.token_url.clone())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let received_at = Utc::now();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint { status, body });
        }

        let payload: TokenResponse = response.json().await?;
        let session = AuthSession::from_token_response(payload, received_at)?;
        Ok(TokenExchangeResult {
            session,
            received_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::StatusCode;

    fn client_for(server: &MockServer, config: OAuthConfig) -> OAuthClient {
        let endpoints = OAuthEndpoints {
            authorization_url: Url::parse("http://localhost/authorize").unwrap(),
            token_url: Url::parse(&server.url("/oauth2/token")).unwrap(),
        };
        OAuthClient::with_endpoints(config, endpoints).unwrap()
    }

    fn config() -> OAuthConfig {
        OAuthConfig::new("client-id", Url::parse("http://localhost/callback").unwrap())
            .with_secret("client-secret")
    }

    #[test]
    fn authorization_url_carries_request_parameters() {
        let config = OAuthConfig::authorization_code(
            "client-id",
            "secret",
            Url::parse("http://localhost:8080/callback").unwrap(),
        );
        let client = OAuthClient::new(config).unwrap();
        let state = StateToken::generate();
        let url = client.authorization_url(&state);

        assert!(url.as_str().starts_with(DEFAULT_AUTHORIZATION_URL));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("client_id"), Some("client-id"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8080/callback"));
        assert_eq!(get("scope"), Some("basic stash publish"));
        assert_eq!(get("state"), Some(state.as_str()));
        assert!(!url.as_str().contains("secret"));
    }

    #[tokio::test]
    async fn exchange_code_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_contains("grant_type=authorization_code")
                .body_contains("code=code123")
                .body_contains("client_secret=client-secret");
            then.status(200).json_body_obj(&serde_json::json!({
                "status": "success",
                "access_token": "abc123",
                "refresh_token": "refresh456",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "basic stash"
            }));
        });

        let client = client_for(&server, config());
        let result = client.exchange_code("code123").await.unwrap();
        mock.assert();
        assert_eq!(result.session.access_token, "abc123");
        assert_eq!(result.session.refresh_token.as_deref(), Some("refresh456"));
        assert_eq!(result.session.scope, vec!["basic", "stash"]);
        assert_eq!(result.session.issued_at, result.received_at);
        assert_eq!(
            result.session.expires_at,
            Some(result.received_at + chrono::Duration::seconds(3600))
        );
    }

    #[tokio::test]
    async fn refresh_token_missing() {
        let session = AuthSession::bearer("key");
        let client = OAuthClient::new(config()).unwrap();
        let result = client.refresh_session(&session).await;
        assert!(matches!(result.unwrap_err(), AuthError::RefreshUnavailable));
    }

    #[tokio::test]
    async fn refresh_keeps_existing_refresh_token_when_not_returned() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=refresh_token")
                .body_contains("refresh_token=refresh456");
            then.status(200).json_body_obj(&serde_json::json!({
                "access_token": "new-access",
                "token_type": "bearer",
                "expires_in": 7200,
                "scope": "basic"
            }));
        });

        let client = client_for(&server, config());
        let session = AuthSession::bearer("old-access").with_refresh_token("refresh456");
        let result = client.refresh_session(&session).await.unwrap();
        mock.assert();
        assert_eq!(result.session.access_token, "new-access");
        assert_eq!(result.session.refresh_token.as_deref(), Some("refresh456"));
    }

    #[tokio::test]
    async fn token_endpoint_failure_is_returned_verbatim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(401).body(
                r#"{"error":"invalid_client","error_description":"Bad client credentials."}"#,
            );
        });

        let client = client_for(&server, config());
        let err = client.exchange_code("bad").await.unwrap_err();
        mock.assert();
        match err {
            AuthError::TokenEndpoint { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_token_type_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth2/token");
            then.status(200).json_body_obj(&serde_json::json!({
                "access_token": "abc",
                "token_type": "mac",
            }));
        });

        let client = client_for(&server, config());
        let err = client.exchange_code("code").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenType(kind) if kind == "mac"));
    }

    #[tokio::test]
    async fn client_credentials_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=client_credentials")
                .body_contains("client_id=client-id");
            then.status(200).json_body_obj(&serde_json::json!({
                "access_token": "machine-token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "status": "success"
            }));
        });

        let client = client_for(&server, config());
        let result = client.client_credentials(&[]).await.unwrap();
        mock.assert();
        assert_eq!(result.session.access_token, "machine-token");
        assert!(result.session.refresh_token.is_none());
        assert!(result.session.scope.is_empty());
    }
}
