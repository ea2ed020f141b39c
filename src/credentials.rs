//! Supplies the WebSocket URL and `Sec-WebSocket-Key` needed to open a
//! feed connection.
//!
//! The upstream service hands out a session-scoped URL and key pair rather
//! than a long-lived API token, so acquiring them is modeled as its own
//! seam: a [`CredentialProvider`]. Discovering a fresh pair (e.g. by
//! driving a headless browser against the provider's web UI) is out of
//! scope here — [`StaticCredentialProvider`] is what callers use once they
//! already hold a pair, from whatever acquisition path their deployment
//! uses.

use thiserror::Error;

/// A WebSocket URL together with its `Sec-WebSocket-Key` header value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub feed_url: String,
    pub websocket_key: String,
}

/// An error acquiring credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no credentials available: {0}")]
    Unavailable(String),
}

/// Supplies [`Credentials`] for a feed connection.
pub trait CredentialProvider {
    fn credentials(&self) -> Result<Credentials, CredentialError>;
}

/// A [`CredentialProvider`] that always returns the same pre-supplied
/// credentials, for deployments that provision them out of band (a
/// config file, a secrets manager, a prior browser-automation step run
/// separately from this crate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(feed_url: impl Into<String>, websocket_key: impl Into<String>) -> Self {
        StaticCredentialProvider {
            credentials: Credentials {
                feed_url: feed_url.into(),
                websocket_key: websocket_key.into(),
            },
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn credentials(&self) -> Result<Credentials, CredentialError> {
        Ok(self.credentials.clone())
    }
}
