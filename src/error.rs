use thiserror::Error;

/// A failed call to one of the auth endpoints: the HTTP status plus the
/// backend's "detail" message when the body carried one. Status 0 means the
/// request never produced a response at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("auth request failed with status {status}")]
pub struct AuthFailure {
    pub status: u16,
    pub detail: Option<String>,
}

impl AuthFailure {
    pub fn new(status: u16, detail: Option<String>) -> Self {
        AuthFailure { status, detail }
    }

    /// The request died before a response: DNS, refused, timed out.
    pub fn connection() -> Self {
        AuthFailure {
            status: 0,
            detail: None,
        }
    }
}

/// Everything the client surfaces to its embedder. Variants, not strings,
/// so the UI can branch on the failure kind; [`AuthError::user_message`]
/// renders each one in the product's language.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("could not reach the server: {0}")]
    Connection(String),
    #[error("server error (status {status})")]
    Server { status: u16 },
    #[error("session expired")]
    SessionExpired,
    #[error("upstream integration rejected the request: {message}")]
    Upstream { message: String },
    #[error("unexpected failure (status {status})")]
    Unexpected { status: u16, detail: Option<String> },
}

impl AuthError {
    /// Map a raw login failure onto the taxonomy. Login gets the
    /// finest-grained mapping because the login screen reacts to each case
    /// differently; other requests only distinguish 401 from everything else.
    pub fn from_login_failure(failure: &AuthFailure) -> AuthError {
        match failure.status {
            0 => AuthError::Connection(
                failure
                    .detail
                    .clone()
                    .unwrap_or_else(|| "request did not reach the server".to_string()),
            ),
            401 => AuthError::InvalidCredentials,
            status if status >= 500 => AuthError::Server { status },
            status => AuthError::Unexpected {
                status,
                detail: failure.detail.clone(),
            },
        }
    }

    /// The message shown to the user. Portuguese, matching the rest of the
    /// warehouse UI.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => "Usuário ou senha inválidos.".to_string(),
            AuthError::Connection(_) => {
                "Não foi possível conectar ao servidor. Verifique sua conexão.".to_string()
            }
            AuthError::Server { .. } => {
                "Erro no servidor. Tente novamente mais tarde.".to_string()
            }
            AuthError::SessionExpired => {
                "Sua sessão expirou. Faça login novamente.".to_string()
            }
            AuthError::Upstream { message } => {
                format!("Falha na integração Sankhya: {}", message)
            }
            AuthError::Unexpected { .. } => {
                "Ocorreu um erro inesperado. Tente novamente.".to_string()
            }
        }
    }
}
