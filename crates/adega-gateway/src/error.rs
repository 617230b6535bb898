use thiserror::Error;

/// Errors produced by the identity gateway.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider rejected the request; `code` is its error code
    /// (e.g. `auth/wrong-password`).
    #[error("Provider rejected the request: {code}")]
    Provider { code: String },

    /// Transport-level failure reaching the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a payload we could not interpret.
    #[error("Malformed provider response: {0}")]
    Decode(String),

    /// An operation that needs an authenticated session had none.
    #[error("No active session")]
    NoSession,
}

impl AuthError {
    /// The provider error code, when there is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code } => Some(code),
            _ => None,
        }
    }
}

/// Errors produced by the document-store gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure reaching the store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store refused the write.
    #[error("Store rejected the request: {0}")]
    Rejected(String),

    /// The store answered with a payload we could not interpret.
    #[error("Malformed document payload: {0}")]
    Decode(String),
}
