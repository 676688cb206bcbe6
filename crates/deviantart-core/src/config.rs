use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.deviantart.com/api/v1/oauth2/";
pub const DEFAULT_USER_AGENT: &str = concat!("deviantart-rs/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry policy applied to throttled (HTTP 429) responses.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Total number of sends before giving up, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Ceiling for the doubled delay; `None` lets it grow without bound.
    pub max_backoff: Option<Duration>,
    /// Extra random delay as a fraction of the current backoff, in `0.0..=1.0`.
    pub jitter: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: Some(DEFAULT_MAX_BACKOFF),
            jitter: 0.0,
        }
    }
}

impl RateLimitConfig {
    /// Plain doubling with no ceiling and no jitter.
    pub fn unbounded() -> Self {
        Self {
            max_backoff: None,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_max_backoff(mut self, ceiling: Option<Duration>) -> Self {
        self.max_backoff = ceiling;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Jitter(self.jitter));
        }
        if let Some(ceiling) = self.max_backoff {
            if ceiling < self.initial_backoff {
                return Err(ConfigError::BackoffCeiling {
                    initial: self.initial_backoff,
                    ceiling,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn first_backoff(&self) -> Duration {
        self.clamp(self.initial_backoff)
    }

    pub(crate) fn next_backoff(&self, current: Duration) -> Duration {
        self.clamp(current.saturating_mul(2))
    }

    /// Delay to actually sleep for a given backoff step.
    pub(crate) fn delay_for(&self, backoff: Duration) -> Duration {
        // NaN and infinite fractions never reach the RNG.
        if !self.jitter.is_finite() || self.jitter <= 0.0 {
            return backoff;
        }
        let factor = rand::thread_rng().gen_range(0.0..=self.jitter.min(1.0));
        let extra = Duration::try_from_secs_f64(backoff.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);
        backoff.saturating_add(extra)
    }

    fn clamp(&self, backoff: Duration) -> Duration {
        match self.max_backoff {
            Some(ceiling) => backoff.min(ceiling),
            None => backoff,
        }
    }
}

/// Settings for the API client facade.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Point the client at another API root (e.g. a mock server). A trailing
    /// slash is added so relative endpoint paths join underneath it.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        let mut url = Url::parse(base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.cannot_be_a_base() {
            return Err(ConfigError::BaseUrl(self.base_url.to_string()));
        }
        self.rate_limit.validate()
    }
}

/// Errors raised when validating client or transport settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("jitter must be within 0.0..=1.0, got {0}")]
    Jitter(f64),
    #[error("max_backoff {ceiling:?} is below initial_backoff {initial:?}")]
    BackoffCeiling { initial: Duration, ceiling: Duration },
    #[error("base URL '{0}' cannot be used as an API root")]
    BaseUrl(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
