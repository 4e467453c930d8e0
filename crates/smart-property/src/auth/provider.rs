use async_trait::async_trait;
use tokio::sync::broadcast;

use super::domain::{AuthEvent, Session, SignUpOutcome, SignUpRequest, UserProfile};

/// Capacity of the session-change channel; slow listeners skip stale events.
pub(crate) const EVENT_CAPACITY: usize = 32;

/// Hosted authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Resolve the account behind an access token.
    async fn user_for_token(&self, access_token: &str) -> Result<UserProfile, AuthError>;

    /// Session-change notifications for the lifetime of the provider.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Error enumeration for authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication service is unavailable.")]
    Unavailable,
    /// Provider refused the credentials; the message is shown to the user as is.
    #[error("{0}")]
    Rejected(String),
    #[error("session is missing or expired")]
    InvalidToken,
    #[error("auth provider unreachable: {0}")]
    Transport(String),
    #[error("unexpected auth payload: {0}")]
    Decode(String),
}

/// Provider used when no backend is configured; every call fails.
#[derive(Debug, Clone)]
pub struct UnconfiguredAuth {
    events: broadcast::Sender<AuthEvent>,
}

impl Default for UnconfiguredAuth {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { events }
    }
}

#[async_trait]
impl AuthProvider for UnconfiguredAuth {
    fn is_configured(&self) -> bool {
        false
    }

    async fn sign_up(&self, _request: SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        Err(AuthError::Unavailable)
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::Unavailable)
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Err(AuthError::Unavailable)
    }

    async fn user_for_token(&self, _access_token: &str) -> Result<UserProfile, AuthError> {
        Err(AuthError::Unavailable)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_provider_reports_unavailable() {
        let auth = UnconfiguredAuth::default();
        assert!(!auth.is_configured());
        let err = auth
            .sign_in("harvey@smartproperty.com", "hunter2")
            .await
            .expect_err("no provider");
        assert_eq!(err.to_string(), "Authentication service is unavailable.");
    }
}
