//! Logout token issuance (`logout+jwt`) for back-channel logout.

use std::sync::Arc;

use crate::error::TokenError;
use crate::jwt::{token_types, JsonWebToken, JwtClaims, JwtFormatter, BACKCHANNEL_LOGOUT_EVENT};
use crate::models::{AuthSession, ClientInfo};
use crate::providers::{Clock, IdGenerator, IssuerProvider};

use super::IssuedJwt;

/// Issues logout tokens.
///
/// A logout token identifies the terminated session by `sub` and/or `sid`
/// and carries the back-channel logout event claim. It must never carry a
/// `nonce`: a relying party could otherwise be tricked into accepting it as
/// an identity token.
pub struct LogoutTokenService {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    issuer: Arc<dyn IssuerProvider>,
    formatter: Arc<JwtFormatter>,
}

impl LogoutTokenService {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        issuer: Arc<dyn IssuerProvider>,
        formatter: Arc<JwtFormatter>,
    ) -> Self {
        Self {
            clock,
            ids,
            issuer,
            formatter,
        }
    }

    pub async fn create(
        &self,
        client: &ClientInfo,
        session: &AuthSession,
    ) -> Result<IssuedJwt, TokenError> {
        let back_channel = client
            .back_channel_logout
            .as_ref()
            .ok_or(TokenError::BackChannelLogoutNotConfigured)?;

        if back_channel.requires_session_id && session.session_id.is_empty() {
            return Err(TokenError::SessionIdRequired);
        }
        if session.subject.is_empty() && session.session_id.is_empty() {
            return Err(TokenError::SubjectOrSessionRequired);
        }

        let now = self.clock.now();
        let expires_at = now + chrono::Duration::seconds(back_channel.logout_token_expires_in_secs);
        let jwt_id = self.ids.new_id();

        let mut events = serde_json::Map::new();
        events.insert(
            BACKCHANNEL_LOGOUT_EVENT.to_string(),
            serde_json::Value::Object(serde_json::Map::new()),
        );

        let mut payload = JwtClaims::default();
        payload.iss = Some(self.issuer.issuer().to_string());
        payload.aud = Some(vec![client.client_id.clone()]);
        payload.iat = Some(now.timestamp());
        payload.nbf = Some(now.timestamp());
        payload.exp = Some(expires_at.timestamp());
        payload.jti = Some(jwt_id.clone());
        if !session.subject.is_empty() {
            payload.sub = Some(session.subject.clone());
        }
        if !session.session_id.is_empty() {
            payload.sid = Some(session.session_id.clone());
        }
        payload.events = Some(events);

        let token = JsonWebToken {
            token_type: token_types::LOGOUT,
            algorithm: client.identity_token_signed_response_algorithm,
            payload,
        };
        let value = self.formatter.format(&token, client).await?;

        Ok(IssuedJwt {
            value,
            jwt_id,
            issued_at: now,
            expires_at,
        })
    }
}
