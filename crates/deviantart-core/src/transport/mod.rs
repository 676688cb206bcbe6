//! HTTP plumbing shared by every API call: the [`Sender`] seam, bearer token
//! injection and retry on throttled responses.

mod bearer;
mod rate_limit;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use thiserror::Error;

use crate::auth::AuthError;

pub use bearer::BearerSender;
pub use rate_limit::RateLimitedTransport;

/// Errors produced while getting a request to the API and a response back.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to authorize request: {0}")]
    Auth(#[from] AuthError),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("max retries exceeded after {attempts} throttled attempts")]
    MaxRetriesExceeded { attempts: u32 },
    #[error("request cancelled")]
    Cancelled,
}

/// Anything able to turn a fully built request into a response.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl Sender for Client {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.execute(request).await?)
    }
}
