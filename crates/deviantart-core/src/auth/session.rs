//! Tokens issued by the DeviantArt token endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Raw token endpoint payload. DeviantArt also sends `"status": "success"`,
/// which carries nothing the session needs.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    token_type: String,
    expires_in: Option<i64>,
    scope: Option<String>,
}

/// Bearer token with its lifetime, granted scopes and, for the
/// authorization code grant, a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unknown for tokens minted out of band.
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Vec<String>,
    pub issued_at: DateTime<Utc>,
}

impl AuthSession {
    /// Session for an access token obtained elsewhere, with no known expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: Vec::new(),
            issued_at: Utc::now(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Expire `lifetime` after the session was issued.
    pub fn expiring_in(mut self, lifetime: Duration) -> Self {
        self.expires_at = Some(self.issued_at + lifetime);
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Build a session from a token endpoint reply received at `received_at`.
    /// Only bearer tokens are accepted.
    pub(crate) fn from_token_response(
        response: TokenResponse,
        received_at: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        if !response.token_type.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::InvalidTokenType(response.token_type));
        }

        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response
                .expires_in
                .map(|seconds| received_at + Duration::seconds(seconds)),
            scope: parse_scope(response.scope.as_deref().unwrap_or_default()),
            issued_at: received_at,
        })
    }

    /// The refresh grant may omit `refresh_token`; the previous one stays
    /// valid in that case.
    pub(crate) fn inherit_refresh_token(&mut self, previous: &AuthSession) {
        if self.refresh_token.is_none() {
            self.refresh_token = previous.refresh_token.clone();
        }
    }

    /// Time left before expiry, zero once expired. `None` when unknown.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| (at - Utc::now()).max(Duration::zero()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Whether the token lapses within `window` from now.
    pub fn expires_within(&self, window: Duration) -> bool {
        self.remaining().is_some_and(|left| left <= window)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|granted| granted == scope)
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Scopes come back space separated from the authorization code grant and
/// comma separated from some client credentials replies.
fn parse_scope(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|scope| !scope.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(value: serde_json::Value) -> TokenResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lifetime_counts_from_receipt() {
        let received_at = Utc::now() - Duration::minutes(10);
        let session = AuthSession::from_token_response(
            response(serde_json::json!({
                "status": "success",
                "access_token": "user-token",
                "refresh_token": "user-refresh",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "basic stash"
            })),
            received_at,
        )
        .unwrap();

        assert_eq!(session.issued_at, received_at);
        assert_eq!(session.expires_at, Some(received_at + Duration::hours(1)));
        assert!(session.remaining().unwrap() <= Duration::minutes(50));
        assert!(session.expires_within(Duration::minutes(51)));
        assert!(!session.expires_within(Duration::minutes(49)));
        assert!(session.has_scope("stash"));
    }

    #[test]
    fn scopes_split_on_spaces_and_commas() {
        assert_eq!(parse_scope("basic, browse  stash"), vec!["basic", "browse", "stash"]);
        assert!(parse_scope("").is_empty());
    }

    #[test]
    fn non_bearer_tokens_are_refused() {
        let err = AuthSession::from_token_response(
            response(serde_json::json!({ "access_token": "a", "token_type": "MAC" })),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenType(kind) if kind == "MAC"));
    }

    #[test]
    fn lapsed_token_reports_zero_remaining() {
        let session = AuthSession::bearer("old").expiring_in(Duration::seconds(-5));
        assert!(session.is_expired());
        assert_eq!(session.remaining(), Some(Duration::zero()));
        assert!(session.expires_within(Duration::zero()));
    }

    #[test]
    fn out_of_band_token_has_no_deadline() {
        let session = AuthSession::bearer("pasted");
        assert_eq!(session.remaining(), None);
        assert!(!session.is_expired());
        assert!(!session.expires_within(Duration::days(365)));
        assert_eq!(session.authorization_header(), "Bearer pasted");
    }

    #[test]
    fn refresh_without_new_refresh_token_keeps_old_one() {
        let previous = AuthSession::bearer("a1").with_refresh_token("r1");
        let mut rotated = AuthSession::bearer("a2").with_refresh_token("r2");
        rotated.inherit_refresh_token(&previous);
        assert_eq!(rotated.refresh_token.as_deref(), Some("r2"));

        let mut bare = AuthSession::bearer("a3");
        bare.inherit_refresh_token(&previous);
        assert_eq!(bare.refresh_token.as_deref(), Some("r1"));
    }
}
