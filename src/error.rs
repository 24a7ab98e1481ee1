use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::ResponseMode;

/// OAuth 2.0 / OpenID Connect error codes emitted by the authorization and
/// end-session pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidScope,
    InvalidTarget,
    UnauthorizedClient,
    UnsupportedResponseType,
    InvalidRequestUri,
    InvalidRequestObject,
    ConsentRequired,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidScope => "invalid_scope",
            ErrorCode::InvalidTarget => "invalid_target",
            ErrorCode::UnauthorizedClient => "unauthorized_client",
            ErrorCode::UnsupportedResponseType => "unsupported_response_type",
            ErrorCode::InvalidRequestUri => "invalid_request_uri",
            ErrorCode::InvalidRequestObject => "invalid_request_object",
            ErrorCode::ConsentRequired => "consent_required",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client-visible validation error.
///
/// Carries the redirect URI and response mode needed to deliver the error to
/// the client. Both are attached by the pipeline once known; an error raised
/// before the redirect URI has been validated is returned as a plain error
/// instead of a redirect.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {description}")]
pub struct RequestError {
    pub code: ErrorCode,
    pub description: String,
    pub redirect_uri: Option<String>,
    pub response_mode: Option<ResponseMode>,
}

impl RequestError {
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            redirect_uri: None,
            response_mode: None,
        }
    }

    pub fn with_response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.response_mode = Some(response_mode);
        self
    }

    /// Whether the error may be delivered via redirect. An unauthorized
    /// client has no trusted redirect URI, so it never redirects.
    pub fn can_redirect(&self) -> bool {
        self.redirect_uri.is_some() && self.code != ErrorCode::UnauthorizedClient
    }
}

/// Storage backend failures. Treated as transient by the callers: PAR
/// consumption failures surface as `invalid_request_uri`, registry failures
/// during rotation abort the rotation and preserve the old token.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend failure")]
    Backend(#[from] anyhow::Error),
}

/// Token creation and validation failures. These are internal errors and are
/// never delivered to the requesting client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no signing key registered for algorithm {0:?}")]
    NoSigningKey(jsonwebtoken::Algorithm),

    #[error("client requires token encryption but no encryptor is configured")]
    EncryptionUnavailable,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("client has no back-channel logout configuration")]
    BackChannelLogoutNotConfigured,

    #[error("client requires a session id in logout tokens")]
    SessionIdRequired,

    #[error("logout token requires a subject or a session id")]
    SubjectOrSessionRequired,

    #[error("storage backend failure")]
    Storage(#[from] StorageError),

    #[error("token encoding failed")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Errors produced by the authorization pipeline as a whole. `Request`
/// variants are client-visible and delivered via the flow's response mode;
/// the rest surface to the caller as internal failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("token issuance failed")]
    Token(#[from] TokenError),

    #[error("storage backend failure")]
    Storage(#[from] StorageError),
}

/// Errors produced by the end-session pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EndSessionError {
    #[error(transparent)]
    Validation(#[from] RequestError),

    #[error("session sign-out failed")]
    SignOut(#[source] anyhow::Error),

    #[error("storage backend failure")]
    Storage(#[from] StorageError),
}
