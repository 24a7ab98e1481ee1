//! The authenticated end-user session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The result of end-user authentication, produced by the (out of scope)
/// authentication front end and consumed by the authorization and
/// end-session pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// The subject identifier of the authenticated user.
    pub subject: String,

    /// The session identifier shared by every grant issued in this session.
    pub session_id: String,

    /// When the user actually authenticated.
    pub authentication_time: DateTime<Utc>,

    /// The identity provider that performed the authentication.
    pub identity_provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amr: Vec<String>,

    /// Every client that obtained a grant during this session. Used by the
    /// end-session pipeline to decide who gets a logout notification.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_client_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Free-form claims carried into every access token of the session.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_claims: serde_json::Map<String, serde_json::Value>,
}

impl AuthSession {
    pub fn new(subject: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            session_id: session_id.into(),
            authentication_time: Utc::now(),
            identity_provider: "local".to_string(),
            acr: None,
            amr: Vec::new(),
            affected_client_ids: Vec::new(),
            email: None,
            email_verified: None,
            additional_claims: serde_json::Map::new(),
        }
    }

    /// Records that a client obtained a grant in this session. Set
    /// semantics: adding the same client twice keeps one entry.
    pub fn add_affected_client(&mut self, client_id: &str) {
        if !self.affected_client_ids.iter().any(|id| id == client_id) {
            self.affected_client_ids.push(client_id.to_string());
        }
    }
}
