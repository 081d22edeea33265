//! HTTP implementation of the auth collaborator.
//!
//! Talks to the hosted auth service's password-grant endpoints and mirrors
//! the resulting session in memory. Transitions the client itself causes
//! (sign-in, sign-out) are published on a broadcast channel so the session
//! store can observe them; the service does not push events over HTTP.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::broadcast;

use crossskill_core::entities::{AuthUser, Session};

use crate::contract::{AuthEvent, AuthProvider};
use crate::error::AuthError;

/// Buffer capacity for the auth event channel.
const EVENT_CAPACITY: usize = 16;

/// HTTP client for the external auth service.
pub struct HttpAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

/// Response of the password-grant token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

/// Sign-up responses carry the new user either at the top level or under a
/// `user` key depending on whether email confirmation is enabled.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(default)]
    id: Option<uuid::Uuid>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: uuid::Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl WireUser {
    fn into_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
        }
    }
}

impl SignUpResponse {
    fn into_user(self) -> Result<AuthUser, AuthError> {
        if let Some(user) = self.user {
            return Ok(user.into_user());
        }
        match self.id {
            Some(id) => Ok(AuthUser {
                id,
                email: self.email.unwrap_or_default(),
            }),
            None => Err(AuthError::Decode(
                "sign-up response carried no user".to_string(),
            )),
        }
    }
}

impl HttpAuth {
    /// Create a client for the auth service at `base_url` (no trailing
    /// slash required).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            current: RwLock::new(None),
            events,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn publish(&self, event: AuthEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Map a non-success response into an [`AuthError`] carrying the
    /// service's message verbatim.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(AuthError::Api {
            status: status.as_u16(),
            message: extract_message(&body),
        })
    }
}

#[async_trait]
impl AuthProvider for HttpAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let response = Self::ensure_success(response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let session = Session {
            access_token: token.access_token,
            user: token.user.into_user(),
        };

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/signup"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let response = Self::ensure_success(response).await?;

        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let user = body.into_user()?;
        tracing::info!(user_id = %user.id, "Identity created");
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(session) = session else {
            return Ok(());
        };

        // The local session is already cleared; the remote revocation is
        // best-effort and a failure does not resurrect it.
        let result = self
            .http
            .post(self.endpoint("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Remote sign-out failed; local session cleared anyway");
        }

        tracing::info!(user_id = %session.user.id, "Signed out");
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.snapshot())
    }

    fn changes(&self) -> broadcast::Receiver<AuthEvent> {
        let receiver = self.events.subscribe();
        // The startup snapshot for the new subscriber. Earlier subscribers
        // see it too and treat repeat snapshots as no-ops.
        self.publish(AuthEvent::InitialSession(self.snapshot()));
        receiver
    }
}

/// Pull the service's message out of a JSON error body
/// (`error_description`, `msg` or `message`), falling back to the raw text.
fn extract_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["error_description", "msg", "message"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()))
        })
        .map(String::from)
        .unwrap_or_else(|| body.to_string())
}
