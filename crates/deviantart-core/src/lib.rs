//! Async client for the DeviantArt REST API.
//!
//! Requests go through a transport that retries throttled (`429`) responses
//! with exponential backoff. Tokens come from an [`auth::Authenticator`],
//! either through the client credentials grant or the browser-based
//! authorization code flow with a loopback redirect listener.
//!
//! ```no_run
//! use deviantart_core::auth::Authenticator;
//! use deviantart_core::{ClientConfig, DeviantArtClient};
//! use deviantart_core::pagination::OffsetParams;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), deviantart_core::ClientError> {
//! let auth = Authenticator::client_credentials("client-id", "client-secret")?;
//! let client =
//!     DeviantArtClient::authenticate(&auth, ClientConfig::default(), &CancellationToken::new())
//!         .await?;
//! let newest = client.browse().newest(Some("dragons"), &OffsetParams::new().limit(10)).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod pagination;
pub mod services;
pub mod transport;

pub use client::{ApiError, ClientBuilder, ClientError, ClientResult, DeviantArtClient};
pub use config::{ClientConfig, ConfigError, RateLimitConfig};
