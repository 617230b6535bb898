//! Identity provider seam: sign-up/sign-in, display-name updates, and the
//! session-change stream the controller subscribes to.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use adega_shared::types::{Session, UserId};

use crate::config::GatewayConfig;
use crate::error::AuthError;
use crate::fanout::Fanout;

/// Session-change notifications: `Some` on sign-in, `None` on sign-out.
/// An initial notification is always delivered shortly after subscribing.
pub type SessionStream = mpsc::Receiver<Option<Session>>;

/// Contract of the managed identity provider.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self);

    /// Update the authenticated user's display name.
    async fn set_display_name(&self, name: &str) -> Result<Session, AuthError>;

    /// Subscribe to session changes. Dropping the receiver unsubscribes.
    async fn subscribe(&self) -> SessionStream;
}

/// Translate the provider's REST error codes into the SDK-style codes the
/// controller's message table is keyed on. Unknown codes pass through in
/// the same `auth/…` shape so the fallback message catches them.
pub(crate) fn provider_code(rest_code: &str) -> String {
    let code = match rest_code {
        "EMAIL_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "auth/invalid-email",
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential",
        // Delivered as "WEAK_PASSWORD : Password should be at least 6 characters"
        other if other.starts_with("WEAK_PASSWORD") => "auth/weak-password",
        other => {
            return format!("auth/{}", other.to_lowercase().replace('_', "-"));
        }
    };
    code.to_string()
}

// ---------------------------------------------------------------------------
// REST implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct CurrentSession {
    session: Session,
    id_token: String,
}

/// Identity gateway over the provider's `accounts:*` REST endpoints.
pub struct RestIdentityGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    current: Mutex<Option<CurrentSession>>,
    sessions: Fanout<Option<Session>>,
}

impl RestIdentityGateway {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().user_agent("adega/0.1").build()?;
        Ok(Self {
            http,
            config,
            current: Mutex::new(None),
            sessions: Fanout::new(),
        })
    }

    fn endpoint(&self, op: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.config.identity_url.trim_end_matches('/'),
            op,
            self.config.api_key
        )
    }

    fn current(&self) -> MutexGuard<'_, Option<CurrentSession>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn call(&self, op: &str, body: serde_json::Value) -> Result<AuthResponse, AuthError> {
        let resp = self.http.post(self.endpoint(op)).json(&body).send().await?;

        if resp.status().is_success() {
            resp.json::<AuthResponse>()
                .await
                .map_err(|e| AuthError::Decode(e.to_string()))
        } else {
            let payload: ErrorPayload = resp
                .json()
                .await
                .map_err(|e| AuthError::Decode(e.to_string()))?;
            Err(AuthError::Provider {
                code: provider_code(&payload.error.message),
            })
        }
    }

    fn remember(&self, session: Session, id_token: Option<String>) {
        let mut current = self.current();
        *current = Some(CurrentSession {
            session: session.clone(),
            id_token: id_token.unwrap_or_default(),
        });
        drop(current);
        self.sessions.send(Some(session));
    }
}

#[async_trait]
impl IdentityGateway for RestIdentityGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .call(
                "signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let session = Session {
            user_id: UserId(resp.local_id),
            display_name: resp.display_name.unwrap_or_default(),
        };
        info!(user = %session.user_id, "Account created");
        self.remember(session.clone(), resp.id_token);
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .call(
                "signInWithPassword",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let session = Session {
            user_id: UserId(resp.local_id),
            display_name: resp.display_name.unwrap_or_default(),
        };
        info!(user = %session.user_id, "Signed in");
        self.remember(session.clone(), resp.id_token);
        Ok(session)
    }

    async fn sign_out(&self) {
        // The provider keeps no server-side session; forgetting the token
        // is the whole operation.
        self.current().take();
        debug!("Signed out");
        self.sessions.send(None);
    }

    async fn set_display_name(&self, name: &str) -> Result<Session, AuthError> {
        let id_token = self
            .current()
            .as_ref()
            .map(|c| c.id_token.clone())
            .ok_or(AuthError::NoSession)?;

        self.call(
            "update",
            serde_json::json!({
                "idToken": id_token,
                "displayName": name,
                "returnSecureToken": false,
            }),
        )
        .await?;

        let mut current = self.current();
        let updated = match current.as_mut() {
            Some(c) => {
                c.session.display_name = name.to_string();
                c.session.clone()
            }
            None => return Err(AuthError::NoSession),
        };
        drop(current);

        info!(name = %name, "Display name updated");
        self.sessions.send(Some(updated.clone()));
        Ok(updated)
    }

    async fn subscribe(&self) -> SessionStream {
        let initial = self.current().as_ref().map(|c| c.session.clone());
        self.sessions.subscribe(Some(initial))
    }
}
