use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::domain::{AuthEvent, Session, SignUpOutcome, SignUpRequest, UserProfile};
use super::provider::{AuthError, AuthProvider, EVENT_CAPACITY};
use crate::supabase::{error_message, SupabaseClient};

/// Email/password authentication against the hosted GoTrue API.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: SupabaseClient,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, events }
    }

    fn url(&self, path: &str) -> Result<url::Url, AuthError> {
        self.client
            .auth_url(path)
            .map_err(|err| AuthError::Transport(err.to_string()))
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers simply means nobody is listening yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    fn is_configured(&self) -> bool {
        true
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .client
            .request(Method::POST, self.url("signup")?, None)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": {
                    "full_name": request.name,
                    "role": request.role.label(),
                },
            }))
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            let (_, message) = error_message(response).await;
            return Err(AuthError::Rejected(message));
        }

        let payload: SignUpPayload = response
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;
        match payload.into_session() {
            Some(session) => {
                info!(user = %session.user.id, "account created and signed in");
                self.publish(AuthEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome::SignedIn { session })
            }
            None => {
                info!("account created; email confirmation pending");
                Ok(SignUpOutcome::ConfirmationRequired {
                    email: request.email,
                })
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut url = self.url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            let (_, message) = error_message(response).await;
            return Err(AuthError::Rejected(message));
        }

        let payload: SessionPayload = response
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;
        let session = payload.into_session();
        info!(user = %session.user.id, "signed in");
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .request(Method::POST, self.url("logout")?, Some(access_token))
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            if status.as_u16() == 401 {
                return Err(AuthError::InvalidToken);
            }
            return Err(AuthError::Rejected(message));
        }
        debug!("session revoked");
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    async fn user_for_token(&self, access_token: &str) -> Result<UserProfile, AuthError> {
        let response = self
            .client
            .request(Method::GET, self.url("user")?, Some(access_token))
            .send()
            .await
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => return Err(AuthError::InvalidToken),
            _ => {
                let (_, message) = error_message(response).await;
                return Err(AuthError::Rejected(message));
            }
        }
        let user: UserPayload = response
            .json()
            .await
            .map_err(|err| AuthError::Decode(err.to_string()))?;
        Ok(user.into_profile())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl UserPayload {
    fn into_profile(self) -> UserProfile {
        UserProfile::from_provider(
            self.id,
            self.email,
            self.user_metadata.full_name,
            self.user_metadata.role,
        )
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: UserPayload,
}

impl SessionPayload {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            user: self.user.into_profile(),
        }
    }
}

/// Sign-up answers with a full session when confirmation is disabled and with
/// the bare user object otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(SessionPayload),
    User(UserPayload),
}

impl SignUpPayload {
    fn into_session(self) -> Option<Session> {
        match self {
            SignUpPayload::Session(payload) => Some(payload.into_session()),
            SignUpPayload::User(_) => None,
        }
    }
}
