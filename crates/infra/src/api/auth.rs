//! Session token handling
//!
//! The server accepts an access token as the Basic-auth username with the
//! literal password `token`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clusterwatch_core::SessionProvider;
use clusterwatch_domain::{ClusterWatchError, Result};
use parking_lot::RwLock;
use tracing::info;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token, or `ApiError::Auth` without a session.
    async fn access_token(&self) -> std::result::Result<String, ApiError>;
}

/// `Authorization` header value for `token`.
pub fn basic_authorization(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{token}:token")))
}

/// Holds the current session token
///
/// Shared behind an `Arc` by the API client (as [`AccessTokenProvider`]) and
/// the metrics store (as [`SessionProvider`]).
#[derive(Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that is already logged in with `token`.
    pub fn with_token(token: impl Into<String>) -> Result<Self> {
        let session = Self::new();
        session.login(token)?;
        Ok(session)
    }

    /// Start a session, replacing any previous token.
    ///
    /// # Errors
    ///
    /// Returns `ClusterWatchError::InvalidInput` for a blank token.
    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClusterWatchError::InvalidInput("access token must not be empty".into()));
        }

        *self.token.write() = Some(token);
        info!("Session started");
        Ok(())
    }

    /// Forget the token; later `list` calls skip fetching.
    pub fn logout(&self) {
        if self.token.write().take().is_some() {
            info!("Session ended");
        }
    }

    /// Whether a token is held.
    pub fn is_logged_in(&self) -> bool {
        self.token.read().is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("logged_in", &self.is_logged_in()).finish()
    }
}

impl SessionProvider for SessionStore {
    fn is_logged_in(&self) -> bool {
        SessionStore::is_logged_in(self)
    }
}

#[async_trait]
impl AccessTokenProvider for SessionStore {
    async fn access_token(&self) -> std::result::Result<String, ApiError> {
        self.token.read().clone().ok_or_else(|| ApiError::Auth("not logged in".into()))
    }
}
