//! Refresh token issuance, renewal and replay prevention (`rt+jwt`).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::Algorithm;
use tracing::warn;

use crate::error::TokenError;
use crate::jwt::{token_types, JsonWebToken, JwtClaims, JwtFormatter, JwtValidator, ValidationOptions};
use crate::models::{AuthSession, AuthorizationContext, ClientInfo, JsonWebTokenStatus};
use crate::providers::{Clock, IdGenerator, IssuerProvider};

use super::{timestamp_to_datetime, IssuedJwt, TokenRegistry};

/// A grant reconstructed from a refresh token, ready for the token endpoint
/// to act on.
#[derive(Debug, Clone)]
pub struct RefreshTokenGrant {
    pub session: AuthSession,
    pub context: AuthorizationContext,
    /// The raw refresh token the grant was derived from.
    pub token: String,
    /// Its validated payload.
    pub claims: JwtClaims,
}

/// Issues and rotates refresh tokens.
///
/// Expiration policy: a fresh token lives `absolute_expires_in` from its
/// `iat`. Renewal keeps the original `iat` and, when the client has a
/// sliding window, extends the expiry by that window, never past the
/// absolute ceiling computed from the original `iat`.
pub struct RefreshTokenService {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    issuer: Arc<dyn IssuerProvider>,
    formatter: Arc<JwtFormatter>,
    validator: Arc<JwtValidator>,
    registry: Arc<TokenRegistry>,
}

impl RefreshTokenService {
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        issuer: Arc<dyn IssuerProvider>,
        formatter: Arc<JwtFormatter>,
        validator: Arc<JwtValidator>,
        registry: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            clock,
            ids,
            issuer,
            formatter,
            validator,
            registry,
        }
    }

    /// Issue a fresh refresh token for the grant.
    pub async fn create(
        &self,
        session: &AuthSession,
        context: &AuthorizationContext,
        client: &ClientInfo,
    ) -> Result<IssuedJwt, TokenError> {
        let now = self.clock.now();
        let expires_at = now + Duration::seconds(client.refresh_token.absolute_expires_in_secs);

        self.issue(session, context, client, now, now, expires_at).await
    }

    /// Renew an existing refresh token.
    ///
    /// Returns `Ok(None)` when the renewal window has closed: the absolute
    /// deadline computed from the original `iat` has passed. When the
    /// client forbids reuse, the old token's `jti` is recorded revoked
    /// before the replacement is issued; a registry failure aborts the
    /// rotation and leaves the old token valid.
    pub async fn renew(
        &self,
        token: &str,
        client: &ClientInfo,
    ) -> Result<Option<IssuedJwt>, TokenError> {
        let old = self.validate(token).await?;

        let old_jti = old.jti.clone().ok_or(TokenError::InvalidToken)?;
        let old_iat = timestamp_to_datetime(old.iat.ok_or(TokenError::InvalidToken)?)?;
        let old_exp = timestamp_to_datetime(old.exp.ok_or(TokenError::InvalidToken)?)?;

        let now = self.clock.now();
        let absolute_deadline =
            old_iat + Duration::seconds(client.refresh_token.absolute_expires_in_secs);
        let expires_at = match client.refresh_token.sliding_expires_in_secs {
            Some(sliding) => absolute_deadline.min(now + Duration::seconds(sliding)),
            None => absolute_deadline,
        };

        if expires_at <= now {
            return Ok(None);
        }

        if !client.refresh_token.allow_reuse {
            // Revocation must commit before the replacement exists. If it
            // fails, the old token stays valid and no new one is issued.
            self.registry
                .set_status(&old_jti, JsonWebTokenStatus::Revoked, old_exp)
                .await?;
        }

        let (session, context) = reconstruct(&old)?;
        let issued = self
            .issue(&session, &context, client, old_iat, now, expires_at)
            .await?;
        Ok(Some(issued))
    }

    /// Rebuild the grant a refresh token was issued under.
    pub async fn authorize_from_token(&self, token: &str) -> Result<RefreshTokenGrant, TokenError> {
        let claims = self.validate(token).await?;
        let (session, context) = reconstruct(&claims)?;

        Ok(RefreshTokenGrant {
            session,
            context,
            token: token.to_string(),
            claims,
        })
    }

    async fn validate(&self, token: &str) -> Result<JwtClaims, TokenError> {
        let options = ValidationOptions {
            expected_type: Some(token_types::REFRESH),
            ..Default::default()
        };
        let validated = self.validator.validate(token, &options).await?;

        if let Some(jti) = &validated.claims.jti {
            match self.registry.get_status(jti).await? {
                JsonWebTokenStatus::Unknown => {}
                status => {
                    warn!(jti = %jti, ?status, "refresh token replayed after rotation");
                    return Err(TokenError::TokenRevoked);
                }
            }
        }

        Ok(validated.claims)
    }

    async fn issue(
        &self,
        session: &AuthSession,
        context: &AuthorizationContext,
        client: &ClientInfo,
        issued_at: DateTime<Utc>,
        not_before: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<IssuedJwt, TokenError> {
        let jwt_id = self.ids.new_id();

        let mut payload = JwtClaims::default();
        payload.iss = Some(self.issuer.issuer().to_string());
        payload.iat = Some(issued_at.timestamp());
        payload.nbf = Some(not_before.timestamp());
        payload.exp = Some(expires_at.timestamp());
        payload.jti = Some(jwt_id.clone());
        payload.sub = Some(session.subject.clone());
        payload.sid = Some(session.session_id.clone());
        payload.aud = Some(vec![context.client_id.clone()]);
        payload.client_id = Some(context.client_id.clone());
        payload.scope = Some(context.scope.clone());
        payload.auth_time = Some(session.authentication_time.timestamp());
        payload.idp = Some(session.identity_provider.clone());

        let token = JsonWebToken {
            token_type: token_types::REFRESH,
            algorithm: Algorithm::RS256,
            payload,
        };
        let value = self.formatter.format(&token, client).await?;

        Ok(IssuedJwt {
            value,
            jwt_id,
            issued_at,
            expires_at,
        })
    }
}

fn reconstruct(claims: &JwtClaims) -> Result<(AuthSession, AuthorizationContext), TokenError> {
    let client_id = claims.client_id.clone().ok_or(TokenError::InvalidToken)?;
    let subject = claims.sub.clone().ok_or(TokenError::InvalidToken)?;

    let mut session = AuthSession::new(subject, claims.sid.clone().unwrap_or_default());
    if let Some(auth_time) = claims.auth_time {
        session.authentication_time = timestamp_to_datetime(auth_time)?;
    }
    if let Some(idp) = &claims.idp {
        session.identity_provider = idp.clone();
    }

    let context = AuthorizationContext {
        client_id,
        scope: claims.scope.clone().unwrap_or_default(),
        ..Default::default()
    };

    Ok((session, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{ServiceKey, StaticKeyResolver};
    use crate::providers::{ManualClock, StaticIssuer, UuidIdGenerator};
    use crate::storage::InMemoryStorage;

    const PRIVATE_PEM: &str = include_str!("../../keys/private.pem");
    const PUBLIC_PEM: &str = include_str!("../../keys/public.pem");

    struct Fixture {
        clock: Arc<ManualClock>,
        registry: Arc<TokenRegistry>,
        service: RefreshTokenService,
    }

    fn fixture_at(now: DateTime<Utc>) -> Fixture {
        let clock = Arc::new(ManualClock::new(now));
        let keys: Arc<StaticKeyResolver> = Arc::new(StaticKeyResolver::single(
            ServiceKey::from_rsa_pem(None, Algorithm::RS256, PRIVATE_PEM, PUBLIC_PEM).unwrap(),
        ));
        let registry = Arc::new(TokenRegistry::new(Arc::new(InMemoryStorage::with_clock(
            clock.clone(),
        ))));
        let service = RefreshTokenService::new(
            clock.clone(),
            Arc::new(UuidIdGenerator),
            Arc::new(StaticIssuer::new("https://op.example.com")),
            Arc::new(JwtFormatter::new(keys.clone())),
            Arc::new(JwtValidator::new(keys, clock.clone())),
            registry.clone(),
        );
        Fixture {
            clock,
            registry,
            service,
        }
    }

    fn session() -> AuthSession {
        AuthSession::new("user_1", "session_1")
    }

    fn context() -> AuthorizationContext {
        AuthorizationContext {
            client_id: "client_1".to_string(),
            scope: vec!["openid".to_string(), "offline_access".to_string()],
            ..Default::default()
        }
    }

    fn client_with_policy(absolute_hours: i64, sliding_hours: Option<i64>) -> ClientInfo {
        let mut client = ClientInfo::new("client_1");
        client.refresh_token.absolute_expires_in_secs = absolute_hours * 3600;
        client.refresh_token.sliding_expires_in_secs = sliding_hours.map(|h| h * 3600);
        client
    }

    #[tokio::test]
    async fn test_fresh_token_lives_the_absolute_window() {
        let now = Utc::now();
        let fixture = fixture_at(now);
        let client = client_with_policy(8, None);

        let issued = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        assert_eq!(issued.issued_at, now);
        assert_eq!(issued.expires_at, now + Duration::hours(8));

        let header = jsonwebtoken::decode_header(&issued.value).unwrap();
        assert_eq!(header.typ.as_deref(), Some("rt+jwt"));
    }

    #[tokio::test]
    async fn test_renewal_preserves_iat_and_revokes_old_jti() {
        // Rotation two hours into an eight-hour absolute policy.
        let issue_time = Utc::now();
        let fixture = fixture_at(issue_time);
        let client = client_with_policy(8, None);

        let old = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        fixture.clock.advance(Duration::hours(2));
        let renewed = fixture
            .service
            .renew(&old.value, &client)
            .await
            .unwrap()
            .unwrap();

        // iat preserved, expiry pinned to the original absolute deadline.
        assert_eq!(renewed.issued_at, issue_time);
        assert_eq!(renewed.expires_at, issue_time + Duration::hours(8));

        // The old jti is revoked until the old token's own expiry.
        assert_eq!(
            fixture.registry.get_status(&old.jwt_id).await.unwrap(),
            JsonWebTokenStatus::Revoked
        );

        // And replaying the old token is refused.
        let replay = fixture.service.renew(&old.value, &client).await;
        assert!(matches!(replay, Err(TokenError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_sliding_window_extends_renewed_expiry() {
        let start = Utc::now();
        let fixture = fixture_at(start);
        let client = client_with_policy(8, Some(2));

        let old = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();
        assert_eq!(old.expires_at, start + Duration::hours(8));

        fixture.clock.advance(Duration::hours(1));
        let renewed = fixture
            .service
            .renew(&old.value, &client)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renewed.expires_at, start + Duration::hours(3));
        // nbf tracks the renewal, iat does not.
        assert_eq!(renewed.issued_at, start);
    }

    #[tokio::test]
    async fn test_sliding_window_capped_at_absolute_deadline() {
        let start = Utc::now();
        let fixture = fixture_at(start);
        let client = client_with_policy(8, Some(10));

        let old = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        fixture.clock.advance(Duration::hours(1));
        let renewed = fixture
            .service
            .renew(&old.value, &client)
            .await
            .unwrap()
            .unwrap();

        // now + 10h would overshoot; the original ceiling wins.
        assert_eq!(renewed.expires_at, start + Duration::hours(8));
    }

    #[tokio::test]
    async fn test_renewal_past_absolute_deadline_returns_none() {
        let start = Utc::now();
        let fixture = fixture_at(start);
        let client = client_with_policy(8, Some(10));

        let old = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        // Exactly at the deadline the computed expiry is not in the future
        // any more; the renewal declines rather than erroring.
        fixture.clock.advance(Duration::hours(8));
        let renewed = fixture.service.renew(&old.value, &client).await.unwrap();
        assert!(renewed.is_none());

        // A declined renewal revokes nothing.
        assert_eq!(
            fixture.registry.get_status(&old.jwt_id).await.unwrap(),
            JsonWebTokenStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_reuse_allowed_skips_revocation() {
        let fixture = fixture_at(Utc::now());
        let mut client = client_with_policy(8, None);
        client.refresh_token.allow_reuse = true;

        let old = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        fixture.clock.advance(Duration::hours(1));
        fixture.service.renew(&old.value, &client).await.unwrap().unwrap();

        assert_eq!(
            fixture.registry.get_status(&old.jwt_id).await.unwrap(),
            JsonWebTokenStatus::Unknown
        );
        // The old token remains renewable.
        assert!(fixture.service.renew(&old.value, &client).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_authorize_from_token_reconstructs_grant() {
        let fixture = fixture_at(Utc::now());
        let client = client_with_policy(8, None);

        let issued = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        let grant = fixture
            .service
            .authorize_from_token(&issued.value)
            .await
            .unwrap();

        assert_eq!(grant.session.subject, "user_1");
        assert_eq!(grant.session.session_id, "session_1");
        assert_eq!(grant.context.client_id, "client_1");
        assert_eq!(grant.context.scope, vec!["openid", "offline_access"]);
        assert_eq!(grant.token, issued.value);
        assert_eq!(grant.claims.jti.as_deref(), Some(issued.jwt_id.as_str()));
    }

    #[tokio::test]
    async fn test_revoked_token_cannot_authorize() {
        let fixture = fixture_at(Utc::now());
        let client = client_with_policy(8, None);

        let issued = fixture
            .service
            .create(&session(), &context(), &client)
            .await
            .unwrap();

        fixture
            .registry
            .set_status(&issued.jwt_id, JsonWebTokenStatus::Revoked, issued.expires_at)
            .await
            .unwrap();

        let result = fixture.service.authorize_from_token(&issued.value).await;
        assert!(matches!(result, Err(TokenError::TokenRevoked)));
    }
}
