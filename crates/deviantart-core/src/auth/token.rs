use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AuthError, AuthSession, OAuthClient};

const DEFAULT_REFRESH_WINDOW_MINUTES: i64 = 5;

/// Supplies a currently valid session to anything that needs to authorize
/// requests. Implementations decide how and when tokens are renewed.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn session(&self) -> Result<AuthSession, AuthError>;
}

/// Hands out the same session forever.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    session: AuthSession,
}

impl StaticTokenSource {
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    pub fn from_access_token(token: impl Into<String>) -> Self {
        Self::new(AuthSession::bearer(token))
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn session(&self) -> Result<AuthSession, AuthError> {
        Ok(self.session.clone())
    }
}

#[derive(Debug, Clone)]
enum Grant {
    AuthorizationCode,
    ClientCredentials { scopes: Vec<String> },
}

/// Token source that renews its session shortly before it expires.
///
/// Sessions carrying a refresh token use the refresh grant. Client
/// credentials sessions have none, so the grant is simply repeated.
#[derive(Debug)]
pub struct RefreshingTokenSource {
    oauth: OAuthClient,
    grant: Grant,
    session: Mutex<AuthSession>,
    refresh_window: Duration,
}

impl RefreshingTokenSource {
    pub fn authorization_code(oauth: OAuthClient, session: AuthSession) -> Self {
        Self::with_grant(oauth, Grant::AuthorizationCode, session)
    }

    pub fn client_credentials(oauth: OAuthClient, scopes: Vec<String>, session: AuthSession) -> Self {
        Self::with_grant(oauth, Grant::ClientCredentials { scopes }, session)
    }

    fn with_grant(oauth: OAuthClient, grant: Grant, session: AuthSession) -> Self {
        Self {
            oauth,
            grant,
            session: Mutex::new(session),
            refresh_window: Duration::minutes(DEFAULT_REFRESH_WINDOW_MINUTES),
        }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    /// Session as currently held, without attempting a refresh.
    pub async fn current(&self) -> AuthSession {
        self.session.lock().await.clone()
    }

    async fn renew(&self, existing: &AuthSession) -> Result<AuthSession, AuthError> {
        if existing.refresh_token.is_some() {
            return Ok(self.oauth.refresh_session(existing).await?.session);
        }
        match &self.grant {
            Grant::ClientCredentials { scopes } => {
                Ok(self.oauth.client_credentials(scopes).await?.session)
            }
            Grant::AuthorizationCode => Err(AuthError::RefreshUnavailable),
        }
    }
}

#[async_trait]
impl TokenSource for RefreshingTokenSource {
    async fn session(&self) -> Result<AuthSession, AuthError> {
        // Held across the refresh so concurrent callers wait for one renewal.
        let mut session = self.session.lock().await;
        if session.expires_within(self.refresh_window) {
            debug!(expires_at = ?session.expires_at, "renewing access token");
            *session = self.renew(&session).await?;
        }
        Ok(session.clone())
    }
}
