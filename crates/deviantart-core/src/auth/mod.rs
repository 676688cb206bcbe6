//! OAuth2 authentication: token grants, the loopback authorization code flow
//! and token sources that keep sessions fresh.

mod authenticator;
mod callback;
mod error;
mod loopback;
mod oauth;
mod session;
mod state;
mod token;

pub use authenticator::Authenticator;
pub use callback::{CallbackListener, CapturedCallback, PendingCallback};
pub use error::AuthError;
pub use loopback::{run_loopback_flow, LoopbackOptions};
pub use oauth::{
    OAuthClient, OAuthConfig, OAuthEndpoints, TokenExchangeResult, DEFAULT_AUTHORIZATION_URL,
    DEFAULT_SCOPES, DEFAULT_TOKEN_URL,
};
pub use session::AuthSession;
pub use state::StateToken;
pub use token::{RefreshingTokenSource, StaticTokenSource, TokenSource};
