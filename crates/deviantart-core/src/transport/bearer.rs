use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};

use super::{Sender, TransportError};
use crate::auth::TokenSource;

/// Attaches `Authorization: Bearer <token>` to every outgoing request.
///
/// The token is read from the source on each send so a refresh made between
/// retries is picked up.
#[derive(Clone)]
pub struct BearerSender<S = reqwest::Client> {
    inner: S,
    tokens: Arc<dyn TokenSource>,
}

impl<S: Sender> BearerSender<S> {
    pub fn new(inner: S, tokens: Arc<dyn TokenSource>) -> Self {
        Self { inner, tokens }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenSource> {
        &self.tokens
    }
}

#[async_trait]
impl<S: Sender> Sender for BearerSender<S> {
    async fn send(&self, mut request: Request) -> Result<Response, TransportError> {
        let session = self.tokens.session().await?;
        let mut value = HeaderValue::from_str(&session.authorization_header())?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        self.inner.send(request).await
    }
}

impl<S> fmt::Debug for BearerSender<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerSender").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenSource;
    use httpmock::prelude::*;
    use reqwest::Method;
    use url::Url;

    #[tokio::test]
    async fn attaches_current_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/placebo")
                .header("authorization", "Bearer secret-token");
            then.status(200).body("{\"status\":\"success\"}");
        });

        let sender = BearerSender::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::from_access_token("secret-token")),
        );
        let request = Request::new(Method::GET, Url::parse(&server.url("/placebo")).unwrap());
        let response = sender.send(request).await.unwrap();

        mock.assert();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn token_with_control_characters_is_rejected() {
        let sender = BearerSender::new(
            reqwest::Client::new(),
            Arc::new(StaticTokenSource::from_access_token("bad\ntoken")),
        );
        let request = Request::new(Method::GET, Url::parse("http://127.0.0.1:9/").unwrap());
        let err = sender.send(request).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader(_)));
    }
}
