use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::{AuthError, AuthSession, CallbackListener, OAuthClient, StateToken};

const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Knobs for the browser-based authorization code flow.
#[derive(Debug, Clone)]
pub struct LoopbackOptions {
    /// Launch the system browser on the authorization URL.
    pub open_browser: bool,
    /// How long to wait for the user to finish the consent screen.
    pub timeout: Option<Duration>,
}

impl Default for LoopbackOptions {
    fn default() -> Self {
        Self {
            open_browser: false,
            timeout: Some(DEFAULT_CONSENT_TIMEOUT),
        }
    }
}

/// Run the authorization code flow, capturing the redirect on a loopback
/// listener bound to the configured redirect URL.
///
/// Every call owns its own listener, state token and channel, so concurrent
/// attempts never observe each other's redirects.
pub async fn run_loopback_flow<F>(
    client: &OAuthClient,
    options: &LoopbackOptions,
    cancel: &CancellationToken,
    notify_authorization_url: F,
) -> Result<AuthSession, AuthError>
where
    F: FnOnce(&Url) -> Result<(), AuthError>,
{
    let listener = CallbackListener::bind(&client.config().redirect_uri).await?;
    let client = client.clone_with_redirect(listener.redirect_uri().clone());
    let state = StateToken::generate();
    let auth_url = client.authorization_url(&state);

    let pending = listener.spawn();
    notify_authorization_url(&auth_url)?;

    if options.open_browser {
        open::that(auth_url.as_str()).map_err(|err| AuthError::BrowserLaunch(err.to_string()))?;
    }

    debug!(local_addr = %pending.local_addr(), "waiting for authorization redirect");
    let callback = pending.wait(cancel, options.timeout).await?;

    if !state.verify(&callback.state) {
        warn!("authorization redirect carried an unexpected state, refusing code exchange");
        return Err(AuthError::StateMismatch);
    }

    let token = client.exchange_code(&callback.code).await?;
    debug!("authorization code exchanged");
    Ok(token.session)
}
