//! Validation of inbound JWTs.
//!
//! Two validators live here: [`JwtValidator`] checks tokens this server
//! issued itself (refresh tokens, id_token_hint values) against the service
//! keys, and [`ClientJwtValidator`] checks JWTs a client issued (request
//! objects, client assertions) against the client's registered keys.
//!
//! Lifetime checks run against the engine's [`Clock`] rather than the
//! codec's notion of wall-clock time, so every component of the engine
//! shares one time source.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::error::TokenError;
use crate::models::ClientInfo;
use crate::providers::{Clock, ClientInfoProvider};

use super::keys::KeyResolver;
use super::JwtClaims;

/// Slack allowed on `exp`/`nbf` comparisons, in seconds.
const LIFETIME_LEEWAY_SECS: i64 = 60;

/// Options controlling a single validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Skip `exp`/`nbf` checks. Used for `id_token_hint`, where an expired
    /// token is still acceptable proof of a past login.
    pub disable_lifetime_check: bool,

    /// When set, the token's audience set must contain this value.
    pub expected_audience: Option<String>,

    /// When set, the JOSE `typ` header must match exactly.
    pub expected_type: Option<&'static str>,
}

/// A successfully validated token.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub token_type: Option<String>,
    pub algorithm: Algorithm,
    pub claims: JwtClaims,
}

/// Signature-only validation; registered-claim handling is done by hand.
fn signature_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = Default::default();
    validation
}

fn check_lifetime(claims: &JwtClaims, clock: &dyn Clock) -> Result<(), TokenError> {
    let now = clock.now().timestamp();

    if let Some(exp) = claims.exp {
        if exp <= now - LIFETIME_LEEWAY_SECS {
            return Err(TokenError::TokenExpired);
        }
    }
    if let Some(nbf) = claims.nbf {
        if nbf > now + LIFETIME_LEEWAY_SECS {
            return Err(TokenError::TokenExpired);
        }
    }
    Ok(())
}

/// Validates tokens signed with the service keys.
pub struct JwtValidator {
    keys: Arc<dyn KeyResolver>,
    clock: Arc<dyn Clock>,
}

impl JwtValidator {
    pub fn new(keys: Arc<dyn KeyResolver>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    pub async fn validate(
        &self,
        token: &str,
        options: &ValidationOptions,
    ) -> Result<ValidatedToken, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::InvalidToken)?;

        if let Some(expected) = options.expected_type {
            if header.typ.as_deref() != Some(expected) {
                return Err(TokenError::InvalidToken);
            }
        }

        let keys = self.keys.validation_keys(header.alg).await;
        if keys.is_empty() {
            return Err(TokenError::NoSigningKey(header.alg));
        }

        let validation = signature_validation(header.alg);

        for key in keys {
            if let Ok(data) = decode::<JwtClaims>(token, key.decoding_key(), &validation) {
                if !options.disable_lifetime_check {
                    check_lifetime(&data.claims, &*self.clock)?;
                }
                if let Some(audience) = &options.expected_audience {
                    if !data.claims.has_audience(audience) {
                        return Err(TokenError::InvalidToken);
                    }
                }
                return Ok(ValidatedToken {
                    token_type: data.header.typ,
                    algorithm: data.header.alg,
                    claims: data.claims,
                });
            }
        }

        Err(TokenError::InvalidToken)
    }
}

/// Validates JWTs issued by a client.
///
/// The issuer must be a known `client_id`; the audience must contain the
/// endpoint URI the token was sent to; the signature must verify against one
/// of the client's registered keys; lifetime validation is always on. The
/// resolved client is cached, and one validator instance serves exactly one
/// issuer: feeding it a second issuer is a bug in the caller and fails
/// loudly.
pub struct ClientJwtValidator {
    clients: Arc<dyn ClientInfoProvider>,
    clock: Arc<dyn Clock>,
    endpoint_uri: String,
    resolved: Mutex<Option<ClientInfo>>,
}

impl ClientJwtValidator {
    pub fn new(
        clients: Arc<dyn ClientInfoProvider>,
        clock: Arc<dyn Clock>,
        endpoint_uri: impl Into<String>,
    ) -> Self {
        Self {
            clients,
            clock,
            endpoint_uri: endpoint_uri.into(),
            resolved: Mutex::new(None),
        }
    }

    pub async fn validate(&self, token: &str) -> Result<(ClientInfo, JwtClaims), TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::InvalidToken)?;

        let issuer = peek_issuer(token, header.alg)?.ok_or(TokenError::InvalidToken)?;
        let client = self.client_for_issuer(&issuer).await?;

        let validation = signature_validation(header.alg);

        for client_key in client
            .jwt_validation_keys
            .iter()
            .filter(|k| k.algorithm == header.alg)
        {
            let decoding_key = client_key
                .decoding_key()
                .map_err(|_| TokenError::InvalidToken)?;

            if let Ok(data) = decode::<JwtClaims>(token, &decoding_key, &validation) {
                check_lifetime(&data.claims, &*self.clock)?;
                if !data.claims.has_audience(&self.endpoint_uri) {
                    return Err(TokenError::InvalidToken);
                }
                return Ok((client, data.claims));
            }
        }

        Err(TokenError::InvalidToken)
    }

    async fn client_for_issuer(&self, issuer: &str) -> Result<ClientInfo, TokenError> {
        if let Some(cached) = self.resolved.lock().unwrap().clone() {
            if cached.client_id != issuer {
                panic!(
                    "ClientJwtValidator bound to issuer {:?} was fed issuer {:?}",
                    cached.client_id, issuer
                );
            }
            return Ok(cached);
        }

        let client = self
            .clients
            .try_find(issuer)
            .await?
            .ok_or(TokenError::InvalidToken)?;

        *self.resolved.lock().unwrap() = Some(client.clone());
        Ok(client)
    }
}

/// Read the `iss` claim without verifying the signature.
fn peek_issuer(token: &str, algorithm: Algorithm) -> Result<Option<String>, TokenError> {
    let mut validation = signature_validation(algorithm);
    validation.insecure_disable_signature_validation();

    let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| TokenError::InvalidToken)?;
    Ok(data.claims.iss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::keys::{ServiceKey, StaticKeyResolver};
    use crate::jwt::{token_types, JsonWebToken, JwtFormatter};
    use crate::models::ClientJwtKey;
    use crate::providers::{InMemoryClientRegistry, SystemClock};
    use chrono::{Duration, Utc};

    const PRIVATE_PEM: &str = include_str!("../../keys/private.pem");
    const PUBLIC_PEM: &str = include_str!("../../keys/public.pem");

    const ENDPOINT: &str = "https://op.example.com/connect/authorize";

    fn resolver() -> Arc<StaticKeyResolver> {
        Arc::new(StaticKeyResolver::single(
            ServiceKey::from_rsa_pem(None, Algorithm::RS256, PRIVATE_PEM, PUBLIC_PEM).unwrap(),
        ))
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(resolver(), Arc::new(SystemClock))
    }

    async fn signed_token(exp_offset_secs: i64, aud: &str) -> String {
        let mut payload = JwtClaims::default();
        payload.sub = Some("user_1".to_string());
        payload.aud = Some(vec![aud.to_string()]);
        payload.exp = Some((Utc::now() + Duration::seconds(exp_offset_secs)).timestamp());
        payload.iat = Some(Utc::now().timestamp());

        let token = JsonWebToken {
            token_type: token_types::IDENTITY,
            algorithm: Algorithm::RS256,
            payload,
        };
        JwtFormatter::new(resolver())
            .format(&token, &ClientInfo::new("client_1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let jws = signed_token(300, "client_1").await;
        let validated = validator()
            .validate(&jws, &ValidationOptions::default())
            .await
            .unwrap();

        assert_eq!(validated.token_type.as_deref(), Some("id+jwt"));
        assert_eq!(validated.claims.sub.as_deref(), Some("user_1"));
    }

    #[tokio::test]
    async fn test_expired_token_rejected_unless_lifetime_disabled() {
        let jws = signed_token(-3600, "client_1").await;

        let result = validator().validate(&jws, &ValidationOptions::default()).await;
        assert!(matches!(result, Err(TokenError::TokenExpired)));

        let options = ValidationOptions {
            disable_lifetime_check: true,
            ..Default::default()
        };
        assert!(validator().validate(&jws, &options).await.is_ok());
    }

    #[tokio::test]
    async fn test_not_yet_valid_token_rejected() {
        let mut payload = JwtClaims::default();
        payload.nbf = Some((Utc::now() + Duration::hours(1)).timestamp());
        payload.exp = Some((Utc::now() + Duration::hours(2)).timestamp());
        let token = JsonWebToken {
            token_type: token_types::IDENTITY,
            algorithm: Algorithm::RS256,
            payload,
        };
        let jws = JwtFormatter::new(resolver())
            .format(&token, &ClientInfo::new("client_1"))
            .await
            .unwrap();

        let result = validator().validate(&jws, &ValidationOptions::default()).await;
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_audience_mismatch_rejected() {
        let jws = signed_token(300, "client_1").await;
        let options = ValidationOptions {
            expected_audience: Some("other_client".to_string()),
            ..Default::default()
        };

        let result = validator().validate(&jws, &options).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_type_header_mismatch_rejected() {
        let jws = signed_token(300, "client_1").await;
        let options = ValidationOptions {
            expected_type: Some(token_types::REFRESH),
            ..Default::default()
        };

        let result = validator().validate(&jws, &options).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let result = validator()
            .validate("not-a-jwt", &ValidationOptions::default())
            .await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    fn client_registry_with_secret(client_id: &str, secret: &[u8]) -> Arc<InMemoryClientRegistry> {
        let registry = InMemoryClientRegistry::new();
        let mut client = ClientInfo::new(client_id);
        client.jwt_validation_keys = vec![ClientJwtKey::secret(Algorithm::HS256, secret)];
        registry.add(client);
        Arc::new(registry)
    }

    fn client_validator(registry: Arc<InMemoryClientRegistry>) -> ClientJwtValidator {
        ClientJwtValidator::new(registry, Arc::new(SystemClock), ENDPOINT)
    }

    fn client_signed_jwt(issuer: &str, audience: &str, secret: &[u8]) -> String {
        let mut payload = JwtClaims::default();
        payload.iss = Some(issuer.to_string());
        payload.aud = Some(vec![audience.to_string()]);
        payload.exp = Some((Utc::now() + Duration::minutes(5)).timestamp());

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_jwt_accepted_for_known_issuer() {
        let registry = client_registry_with_secret("client_1", b"client-secret");
        let validator = client_validator(registry);

        let jwt = client_signed_jwt("client_1", ENDPOINT, b"client-secret");
        let (client, claims) = validator.validate(&jwt).await.unwrap();

        assert_eq!(client.client_id, "client_1");
        assert_eq!(claims.iss.as_deref(), Some("client_1"));
    }

    #[tokio::test]
    async fn test_client_jwt_unknown_issuer_rejected() {
        let registry = client_registry_with_secret("client_1", b"client-secret");
        let validator = client_validator(registry);

        let jwt = client_signed_jwt("stranger", ENDPOINT, b"client-secret");
        let result = validator.validate(&jwt).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_client_jwt_wrong_audience_rejected() {
        let registry = client_registry_with_secret("client_1", b"client-secret");
        let validator = client_validator(registry);

        let jwt = client_signed_jwt("client_1", "https://elsewhere.example", b"client-secret");
        let result = validator.validate(&jwt).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_client_jwt_expired_rejected() {
        let registry = client_registry_with_secret("client_1", b"client-secret");
        let validator = client_validator(registry);

        let mut payload = JwtClaims::default();
        payload.iss = Some("client_1".to_string());
        payload.aud = Some(vec![ENDPOINT.to_string()]);
        payload.exp = Some((Utc::now() - Duration::hours(1)).timestamp());
        let jwt = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &payload,
            &jsonwebtoken::EncodingKey::from_secret(b"client-secret"),
        )
        .unwrap();

        let result = validator.validate(&jwt).await;
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_client_jwt_bad_signature_rejected() {
        let registry = client_registry_with_secret("client_1", b"client-secret");
        let validator = client_validator(registry);

        let jwt = client_signed_jwt("client_1", ENDPOINT, b"wrong-secret");
        let result = validator.validate(&jwt).await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    #[should_panic(expected = "bound to issuer")]
    async fn test_mixing_issuers_on_one_instance_panics() {
        let registry = InMemoryClientRegistry::new();
        for id in ["client_1", "client_2"] {
            let mut client = ClientInfo::new(id);
            client.jwt_validation_keys = vec![ClientJwtKey::secret(Algorithm::HS256, b"secret")];
            registry.add(client);
        }
        let validator = client_validator(Arc::new(registry));

        validator
            .validate(&client_signed_jwt("client_1", ENDPOINT, b"secret"))
            .await
            .unwrap();
        let _ = validator
            .validate(&client_signed_jwt("client_2", ENDPOINT, b"secret"))
            .await;
    }
}
