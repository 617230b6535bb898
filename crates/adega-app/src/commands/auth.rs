//! Authentication intents.
//!
//! The controller never shows provider codes to the user: a fixed table
//! maps the known codes to localized messages, everything else falls back
//! to a generic one. No retries; the user re-submits.

use tracing::{info, warn};

use adega_gateway::AuthError;

use crate::controller::Controller;

/// Inline error for a sign-up attempt without a display name.
pub const MSG_MISSING_NAME: &str = "Digite seu nome.";

/// Fallback for provider codes outside the known set.
pub const MSG_GENERIC_AUTH: &str = "Erro ao entrar. Tente novamente.";

fn auth_message(code: &str) -> Option<&'static str> {
    match code {
        "auth/user-not-found" => Some("Usuário não encontrado."),
        "auth/wrong-password" => Some("Senha incorreta."),
        "auth/email-already-in-use" => Some("E-mail já cadastrado."),
        "auth/weak-password" => Some("Senha deve ter ao menos 6 caracteres."),
        "auth/invalid-email" => Some("E-mail inválido."),
        "auth/invalid-credential" => Some("E-mail ou senha incorretos."),
        _ => None,
    }
}

/// Localize a gateway auth error for display.
pub fn localize_auth_error(err: &AuthError) -> String {
    err.code()
        .and_then(auth_message)
        .unwrap_or(MSG_GENERIC_AUTH)
        .to_string()
}

impl Controller {
    /// Sign in with email and password. `Err` carries the localized
    /// message to show inline.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), String> {
        match self.identity.sign_in(email, password).await {
            Ok(session) => {
                info!(user = %session.user_id, "Signed in");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                Err(localize_auth_error(&e))
            }
        }
    }

    /// Create an account, then push the display name to the provider.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<(), String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MSG_MISSING_NAME.to_string());
        }

        let session = match self.identity.sign_up(email, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Sign-up failed");
                return Err(localize_auth_error(&e));
            }
        };

        // The account exists either way; a failed profile update is not
        // worth aborting the whole flow for.
        if let Err(e) = self.identity.set_display_name(name).await {
            warn!(error = %e, "Failed to set display name after sign-up");
        }

        info!(user = %session.user_id, "Account created");
        Ok(())
    }

    pub async fn sign_out(&self) {
        self.identity.sign_out().await;
        info!("Signed out");
    }
}
