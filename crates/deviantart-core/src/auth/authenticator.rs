use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use super::{
    run_loopback_flow, AuthError, LoopbackOptions, OAuthClient, OAuthConfig, OAuthEndpoints,
    RefreshingTokenSource,
};

type NotifyFn = Arc<dyn Fn(&Url) -> Result<(), AuthError> + Send + Sync>;

enum Method {
    ClientCredentials,
    AuthorizationCode {
        options: LoopbackOptions,
        notify: NotifyFn,
    },
}

/// Selects how the client obtains its tokens.
///
/// Client credentials give access to the public, read-only endpoints without
/// user interaction. The authorization code grant walks the user through the
/// consent screen and is required for Sta.sh and publishing.
pub struct Authenticator {
    oauth: OAuthClient,
    method: Method,
}

impl Authenticator {
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        // Unused by this grant, but the config always carries a redirect.
        let redirect = Url::parse("http://localhost/")?;
        let config = OAuthConfig::new(client_id, redirect).with_secret(client_secret);
        Ok(Self::with_client(OAuthClient::new(config)?, false))
    }

    pub fn authorization_code(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: &str,
    ) -> Result<Self, AuthError> {
        let redirect = Url::parse(callback_url)?;
        let config = OAuthConfig::authorization_code(client_id, client_secret, redirect);
        Ok(Self::with_client(OAuthClient::new(config)?, true))
    }

    /// Build from an explicit config, e.g. to target a non-default provider.
    pub fn from_config(
        config: OAuthConfig,
        endpoints: OAuthEndpoints,
        interactive: bool,
    ) -> Result<Self, AuthError> {
        Ok(Self::with_client(
            OAuthClient::with_endpoints(config, endpoints)?,
            interactive,
        ))
    }

    fn with_client(oauth: OAuthClient, interactive: bool) -> Self {
        let method = if interactive {
            Method::AuthorizationCode {
                options: LoopbackOptions::default(),
                notify: Arc::new(log_authorization_url),
            }
        } else {
            Method::ClientCredentials
        };
        Self { oauth, method }
    }

    /// Launch the system browser on the consent screen.
    pub fn open_browser(mut self, open: bool) -> Self {
        if let Method::AuthorizationCode { options, .. } = &mut self.method {
            options.open_browser = open;
        }
        self
    }

    /// Give up waiting for the redirect after `timeout`; `None` waits forever.
    pub fn consent_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Method::AuthorizationCode { options, .. } = &mut self.method {
            options.timeout = timeout;
        }
        self
    }

    /// Replace how the authorization URL is shown to the user. By default it
    /// is emitted as an `info` event.
    pub fn on_authorization_url<F>(mut self, notify: F) -> Self
    where
        F: Fn(&Url) -> Result<(), AuthError> + Send + Sync + 'static,
    {
        if let Method::AuthorizationCode { notify: slot, .. } = &mut self.method {
            *slot = Arc::new(notify);
        }
        self
    }

    pub fn oauth_client(&self) -> &OAuthClient {
        &self.oauth
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.method, Method::AuthorizationCode { .. })
    }

    /// Obtain an initial token and wrap it in a source that keeps it fresh.
    pub async fn authenticate(
        &self,
        cancel: &CancellationToken,
    ) -> Result<RefreshingTokenSource, AuthError> {
        match &self.method {
            Method::ClientCredentials => {
                let scopes = self.oauth.config().scopes.clone();
                let token = self.oauth.client_credentials(&scopes).await?;
                Ok(RefreshingTokenSource::client_credentials(
                    self.oauth.clone(),
                    scopes,
                    token.session,
                ))
            }
            Method::AuthorizationCode { options, notify } => {
                let notify = Arc::clone(notify);
                let session =
                    run_loopback_flow(&self.oauth, options, cancel, move |url| notify(url))
                        .await?;
                Ok(RefreshingTokenSource::authorization_code(
                    self.oauth.clone(),
                    session,
                ))
            }
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.method {
            Method::ClientCredentials => "client_credentials",
            Method::AuthorizationCode { .. } => "authorization_code",
        };
        f.debug_struct("Authenticator")
            .field("client_id", &self.oauth.config().client_id)
            .field("method", &method)
            .finish()
    }
}

fn log_authorization_url(url: &Url) -> Result<(), AuthError> {
    info!(%url, "visit the URL for the auth dialog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::callback::tests::send_redirect;
    use crate::auth::TokenSource;
    use httpmock::prelude::*;

    fn endpoints(server: &MockServer) -> OAuthEndpoints {
        OAuthEndpoints {
            authorization_url: Url::parse("http://localhost/authorize").unwrap(),
            token_url: Url::parse(&server.url("/oauth2/token")).unwrap(),
        }
    }

    #[test]
    fn constructors_pick_the_grant() {
        let cc = Authenticator::client_credentials("id", "secret").unwrap();
        assert!(!cc.is_interactive());
        assert_eq!(cc.oauth_client().config().client_secret.as_deref(), Some("secret"));

        let code = Authenticator::authorization_code("id", "secret", "http://localhost:8080/cb")
            .unwrap();
        assert!(code.is_interactive());
        assert_eq!(
            code.oauth_client().config().scopes,
            vec!["basic", "stash", "publish"]
        );
        assert!(Authenticator::authorization_code("id", "secret", "not a url").is_err());
    }

    #[tokio::test]
    async fn client_credentials_authenticate_without_listener() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=client_credentials")
                .body_contains("client_secret=secret");
            then.status(200).json_body_obj(&serde_json::json!({
                "access_token": "public",
                "token_type": "Bearer",
                "expires_in": 3600,
            }));
        });

        let config = OAuthConfig::new("id", Url::parse("http://localhost/").unwrap())
            .with_secret("secret");
        let auth = Authenticator::from_config(config, endpoints(&server), false).unwrap();
        let source = auth.authenticate(&CancellationToken::new()).await.unwrap();
        mock.assert();
        assert_eq!(source.session().await.unwrap().access_token, "public");
    }

    #[tokio::test]
    async fn authorization_code_runs_loopback_flow() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth2/token")
                .body_contains("grant_type=authorization_code")
                .body_contains("code=granted");
            then.status(200).json_body_obj(&serde_json::json!({
                "access_token": "user-token",
                "refresh_token": "user-refresh",
                "token_type": "Bearer",
                "expires_in": 3600,
            }));
        });

        let config = OAuthConfig::authorization_code(
            "id",
            "secret",
            Url::parse("http://127.0.0.1:0/deviantart/callback").unwrap(),
        );
        let auth = Authenticator::from_config(config, endpoints(&server), true)
            .unwrap()
            .consent_timeout(Some(Duration::from_secs(5)))
            .on_authorization_url(|url| {
                let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
                let find = |key: &str| {
                    pairs
                        .iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v.clone())
                        .unwrap()
                };
                let redirect = Url::parse(&find("redirect_uri")).unwrap();
                let addr = redirect.socket_addrs(|| None).unwrap()[0];
                let target = format!("{}?code=granted&state={}", redirect.path(), find("state"));
                tokio::spawn(async move {
                    send_redirect(addr, &target).await;
                });
                Ok(())
            });

        let source = auth.authenticate(&CancellationToken::new()).await.unwrap();
        mock.assert();
        let session = source.session().await.unwrap();
        assert_eq!(session.access_token, "user-token");
        assert_eq!(session.refresh_token.as_deref(), Some("user-refresh"));
    }
}
