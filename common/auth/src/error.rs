use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("auth header empty")]
    AuthHeaderEmpty,
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("unexpected signing method: {0}")]
    UnsupportedAlgorithm(String),
    #[error("token missing kid header")]
    MissingKeyId,
    #[error("no verification key published for kid '{0}'")]
    UnknownKey(String),
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial { reason: String },
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token does not contain issuer")]
    MissingIssuer,
    #[error("iss does not match any of valid values: [{expected}]")]
    IssuerMismatch { expected: String },
    #[error("token_use should be id or access")]
    InvalidTokenUse,
    #[error("token is expired")]
    TokenExpired,
    #[error("failed to fetch JWKS: {0}")]
    KeySetUnavailable(String),
    #[error("unsupported token lookup '{0}', expected 'header:<name>'")]
    InvalidTokenLookup(String),
}

impl AuthError {
    /// Construction-time failures surface as server errors; everything a
    /// request can trigger is a plain 401.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::KeySetUnavailable(_) | AuthError::InvalidTokenLookup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match value.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => Self::InvalidKeyMaterial {
                reason: value.to_string(),
            },
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm(value.to_string()),
            _ => Self::MalformedToken(value.to_string()),
        }
    }
}

/// Default rejection payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody::new(status, self.to_string());
        (status, Json(body)).into_response()
    }
}
