//! Access token issuance (`at+jwt`).

use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::error::TokenError;
use crate::jwt::{token_types, JsonWebToken, JwtClaims, JwtFormatter, JwtValidator, ValidationOptions};
use crate::models::{AuthSession, AuthorizationContext, ClientInfo};
use crate::providers::{Clock, IdGenerator, IssuerProvider};

use super::{merge_additional_claim, timestamp_to_datetime, IssuedJwt};

/// Issues and re-reads access tokens.
pub struct AccessTokenService {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    issuer: Arc<dyn IssuerProvider>,
    formatter: Arc<JwtFormatter>,
    validator: Arc<JwtValidator>,
}

impl AccessTokenService {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        issuer: Arc<dyn IssuerProvider>,
        formatter: Arc<JwtFormatter>,
        validator: Arc<JwtValidator>,
    ) -> Self {
        Self {
            clock,
            ids,
            issuer,
            formatter,
            validator,
        }
    }

    /// Create an access token for the authorized grant.
    ///
    /// The audience is the grant's resource set when one was requested,
    /// otherwise the client itself. The session's additional claims are
    /// merged into the payload at top level.
    pub async fn create(
        &self,
        session: &AuthSession,
        context: &AuthorizationContext,
        client: &ClientInfo,
    ) -> Result<IssuedJwt, TokenError> {
        let now = self.clock.now();
        let expires_at = now + chrono::Duration::seconds(client.access_token_expires_in_secs);
        let jwt_id = self.ids.new_id();

        let mut payload = JwtClaims::default();
        payload.iss = Some(self.issuer.issuer().to_string());
        payload.iat = Some(now.timestamp());
        payload.nbf = Some(now.timestamp());
        payload.exp = Some(expires_at.timestamp());
        payload.jti = Some(jwt_id.clone());
        payload.sub = Some(session.subject.clone());
        payload.sid = Some(session.session_id.clone());
        payload.auth_time = Some(session.authentication_time.timestamp());
        payload.idp = Some(session.identity_provider.clone());
        payload.client_id = Some(context.client_id.clone());
        payload.scope = Some(context.scope.clone());
        payload.email = session.email.clone();
        payload.email_verified = session.email_verified;

        payload.aud = Some(match &context.resources {
            Some(resources) if !resources.is_empty() => resources.clone(),
            _ => vec![context.client_id.clone()],
        });

        for (name, value) in &session.additional_claims {
            merge_additional_claim(&mut payload, name, value.clone());
        }

        let token = JsonWebToken {
            token_type: token_types::ACCESS,
            algorithm: Algorithm::RS256,
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

    /// Re-authenticate from a previously issued access token, rebuilding the
    /// session and authorization context the token was minted under.
    pub async fn authorize_from_token(
        &self,
        token: &str,
    ) -> Result<(AuthSession, AuthorizationContext), TokenError> {
        let options = ValidationOptions {
            expected_type: Some(token_types::ACCESS),
            ..Default::default()
        };
        let validated = self.validator.validate(token, &options).await?;
        let claims = validated.claims;

        let client_id = claims.client_id.clone().ok_or(TokenError::InvalidToken)?;
        let subject = claims.sub.clone().ok_or(TokenError::InvalidToken)?;

        let mut session = AuthSession::new(subject, claims.sid.clone().unwrap_or_default());
        if let Some(auth_time) = claims.auth_time {
            session.authentication_time = timestamp_to_datetime(auth_time)?;
        }
        if let Some(idp) = &claims.idp {
            session.identity_provider = idp.clone();
        }
        session.email = claims.email.clone();
        session.email_verified = claims.email_verified;
        session.additional_claims = claims.additional.clone();

        // The self-audience pattern means "no resources were requested".
        let resources = match &claims.aud {
            Some(aud) if aud.len() == 1 && aud[0] == client_id => None,
            other => other.clone(),
        };

        let context = AuthorizationContext {
            client_id,
            scope: claims.scope.clone().unwrap_or_default(),
            resources,
            ..Default::default()
        };

        Ok((session, context))
    }
}
