use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a privileged request was turned away.
///
/// All three resolve to a redirect; they only differ in logs and telemetry.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionError {
    #[error("no session")]
    NoSession,
    #[error("session expired")]
    ExpiredSession,
    #[error("session subject does not own this path")]
    IdentityMismatch,
}

impl SessionError {
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::NoSession => "no_session",
            SessionError::ExpiredSession => "expired_session",
            SessionError::IdentityMismatch => "identity_mismatch",
        }
    }
}

/// Failure decoding the transport form of a session.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("session token is not signed")]
    Unsigned,
    #[error("session token signature does not match")]
    BadSignature,
    #[error("session signing key rejected")]
    InvalidKey,
    #[error("invalid base64 in session token: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid session payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account inactive")]
    AccountInactive,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            AuthError::AccountInactive => 403,
            AuthError::Internal(_) => 500,
        }
    }
}
