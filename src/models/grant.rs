//! Grant snapshots bound into authorization codes and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::RequestedClaims;
use super::session::AuthSession;

/// The authorization parameters frozen at the moment a grant is issued.
/// Everything the token endpoint later needs to honour the grant lives here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationContext {
    pub client_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_claims: Option<RequestedClaims>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_thumbprint: Option<String>,
}

/// A token issued under a grant, tracked for revocation on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub jwt_id: String,
    pub expires_at: DateTime<Utc>,
}

/// An authorized grant: the authenticated session plus the frozen
/// authorization context, optionally with the tokens already issued under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedGrant {
    pub session: AuthSession,
    pub context: AuthorizationContext,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issued_tokens: Vec<IssuedToken>,
}

/// The outcome of pushing an authorization request: the opaque `request_uri`
/// handed back to the client, the stored request, and the entry's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushedAuthorizationResponse {
    pub request_uri: String,
    pub expires_in_secs: i64,
    pub model: super::request::AuthorizationRequest,
}
