use async_trait::async_trait;

use crate::models::{AuthSession, ClientInfo};
use crate::providers::scopes::{standard_scopes, ScopeDefinition};

/// Source of end-user claims for identity tokens.
///
/// Returning `Ok(None)` means the user is unknown or access was denied; the
/// identity token service then declines to issue a token instead of issuing
/// an empty one.
#[async_trait]
pub trait UserClaimsProvider: Send + Sync {
    async fn get_user_claims(
        &self,
        session: &AuthSession,
        scope: &[ScopeDefinition],
        requested_claims: Option<&serde_json::Map<String, serde_json::Value>>,
        client: &ClientInfo,
    ) -> anyhow::Result<Option<serde_json::Map<String, serde_json::Value>>>;
}

/// Claims provider that answers from the authenticated session itself:
/// `sub` always, `email`/`email_verified` when the `email` scope was
/// granted, and any individually requested claim the session's additional
/// claims happen to carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClaimsProvider;

#[async_trait]
impl UserClaimsProvider for SessionClaimsProvider {
    async fn get_user_claims(
        &self,
        session: &AuthSession,
        scope: &[ScopeDefinition],
        requested_claims: Option<&serde_json::Map<String, serde_json::Value>>,
        _client: &ClientInfo,
    ) -> anyhow::Result<Option<serde_json::Map<String, serde_json::Value>>> {
        if session.subject.is_empty() {
            return Ok(None);
        }

        let mut claims = serde_json::Map::new();
        claims.insert(
            "sub".to_string(),
            serde_json::Value::String(session.subject.clone()),
        );

        if scope.iter().any(|s| s.scope == standard_scopes::EMAIL) {
            if let Some(email) = &session.email {
                claims.insert(
                    "email".to_string(),
                    serde_json::Value::String(email.clone()),
                );
                if let Some(verified) = session.email_verified {
                    claims.insert(
                        "email_verified".to_string(),
                        serde_json::Value::Bool(verified),
                    );
                }
            }
        }

        if let Some(requested) = requested_claims {
            for name in requested.keys() {
                if let Some(value) = session.additional_claims.get(name) {
                    claims.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(Some(claims))
    }
}
