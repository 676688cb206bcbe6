use reqwest::{Request, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Sender, TransportError};
use crate::config::{ConfigError, RateLimitConfig};

/// Decorates a [`Sender`] with retries on `429 Too Many Requests`.
///
/// Only throttled responses are retried. Send failures (DNS, refused
/// connections, timeouts) and every other status go straight back to the
/// caller. The backoff state lives on the stack of each call.
#[derive(Debug, Clone)]
pub struct RateLimitedTransport<S> {
    sender: S,
    config: RateLimitConfig,
}

impl<S: Sender> RateLimitedTransport<S> {
    pub fn new(sender: S) -> Self {
        Self::from_validated(sender, RateLimitConfig::default())
    }

    /// Rejects policies [`RateLimitConfig::validate`] refuses, such as a
    /// zero attempt budget or a jitter outside `0.0..=1.0`.
    pub fn with_config(sender: S, config: RateLimitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(sender, config))
    }

    /// For callers that already ran [`RateLimitConfig::validate`].
    pub(crate) fn from_validated(sender: S, config: RateLimitConfig) -> Self {
        Self { sender, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.execute_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but a cancelled token interrupts the
    /// backoff sleep.
    pub async fn execute_with_cancel(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response, TransportError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.first_backoff();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            let Some(outgoing) = request.try_clone() else {
                debug!(url = %request.url(), "request body is not replayable, sending once");
                return self.sender.send(request).await;
            };

            let response = self.sender.send(outgoing).await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            drop(response);

            if attempt == max_attempts {
                break;
            }

            let delay = self.config.delay_for(backoff);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                url = %request.url(),
                "request throttled, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            backoff = self.config.next_backoff(backoff);
        }

        Err(TransportError::MaxRetriesExceeded {
            attempts: max_attempts,
        })
    }
}
