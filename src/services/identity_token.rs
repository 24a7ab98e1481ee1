//! Identity token issuance (`id+jwt`).

use std::sync::Arc;

use crate::error::TokenError;
use crate::jwt::{token_types, JsonWebToken, JwtClaims, JwtFormatter};
use crate::models::{AuthSession, AuthorizationContext, ClientInfo};
use crate::providers::scopes::standard_scopes;
use crate::providers::{Clock, IdGenerator, IssuerProvider, ScopeDefinition, ScopeManager, UserClaimsProvider};
use crate::utils::hash::half_hash;

use super::{merge_additional_claim, IssuedJwt};

/// Scopes whose claims belong in the userinfo response rather than the
/// identity token when the caller has a channel to fetch them.
const USERINFO_SCOPES: [&str; 3] = [
    standard_scopes::PROFILE,
    standard_scopes::EMAIL,
    standard_scopes::ADDRESS,
];

/// Issues identity tokens.
pub struct IdentityTokenService {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    issuer: Arc<dyn IssuerProvider>,
    formatter: Arc<JwtFormatter>,
    user_claims: Arc<dyn UserClaimsProvider>,
    scopes: Arc<dyn ScopeManager>,
}

impl IdentityTokenService {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        issuer: Arc<dyn IssuerProvider>,
        formatter: Arc<JwtFormatter>,
        user_claims: Arc<dyn UserClaimsProvider>,
        scopes: Arc<dyn ScopeManager>,
    ) -> Self {
        Self {
            clock,
            ids,
            issuer,
            formatter,
            user_claims,
            scopes,
        }
    }

    /// Create an identity token.
    ///
    /// `with_user_claims` says whether this response is the user's only
    /// channel for claims; when it is not (and the client does not force
    /// them in), the profile/email/address scopes are filtered out before
    /// asking the claims provider, leaving those claims to the userinfo
    /// endpoint.
    ///
    /// Returns `Ok(None)` when the claims provider does not know the user
    /// or denies access.
    pub async fn create(
        &self,
        session: &AuthSession,
        context: &AuthorizationContext,
        client: &ClientInfo,
        with_user_claims: bool,
        authorization_code: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Option<IssuedJwt>, TokenError> {
        let algorithm = client.identity_token_signed_response_algorithm;

        let scope: Vec<ScopeDefinition> = context
            .scope
            .iter()
            .filter(|s| {
                with_user_claims
                    || client.force_user_claims_in_identity_token
                    || !USERINFO_SCOPES.contains(&s.as_str())
            })
            .map(|s| {
                self.scopes
                    .get(s)
                    .unwrap_or_else(|| ScopeDefinition::new(s.clone()))
            })
            .collect();

        let requested = context
            .requested_claims
            .as_ref()
            .and_then(|claims| claims.id_token.as_ref());

        let user_claims = match self
            .user_claims
            .get_user_claims(session, &scope, requested, client)
            .await
            .map_err(TokenError::Internal)?
        {
            Some(claims) => claims,
            None => return Ok(None),
        };

        let now = self.clock.now();
        let expires_at = now + chrono::Duration::seconds(client.identity_token_expires_in_secs);
        let jwt_id = self.ids.new_id();

        let mut payload = JwtClaims::default();
        for (name, value) in user_claims {
            merge_additional_claim(&mut payload, &name, value);
        }

        payload.iss = Some(self.issuer.issuer().to_string());
        payload.iat = Some(now.timestamp());
        payload.nbf = Some(now.timestamp());
        payload.exp = Some(expires_at.timestamp());
        payload.jti = Some(jwt_id.clone());
        payload.aud = Some(vec![context.client_id.clone()]);
        payload.nonce = context.nonce.clone();
        payload.sid = Some(session.session_id.clone());
        payload.auth_time = Some(session.authentication_time.timestamp());
        payload.acr = session.acr.clone();
        if !session.amr.is_empty() {
            payload.amr = Some(session.amr.clone());
        }
        if payload.sub.is_none() {
            payload.sub = Some(session.subject.clone());
        }

        payload.c_hash = authorization_code.map(|code| half_hash(algorithm, code));
        payload.at_hash = access_token.map(|token| half_hash(algorithm, token));

        let token = JsonWebToken {
            token_type: token_types::IDENTITY,
            algorithm,
            payload,
        };
        let value = self.formatter.format(&token, client).await?;

        Ok(Some(IssuedJwt {
            value,
            jwt_id,
            issued_at: now,
            expires_at,
        }))
    }
}
