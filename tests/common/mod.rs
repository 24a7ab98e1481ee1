//! Shared wiring for the integration suites: a fully assembled engine over
//! in-memory backends with a pinned clock.

#![allow(dead_code)]

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;

use oidc_authority::authorize::{AuthorizationHandler, AuthorizationProcessor, RequestFetcher};
use oidc_authority::end_session::{
    DefaultLogoutNotifier, EndSessionHandler, EndSessionProcessor, EndSessionRequestValidator,
};
use oidc_authority::error::{AuthorizeError, RequestError};
use oidc_authority::jwt::{JwtFormatter, JwtValidator, ServiceKey, StaticKeyResolver};
use oidc_authority::models::{AuthSession, ClientInfo};
use oidc_authority::providers::{
    InMemoryClientRegistry, InMemoryResourceManager, InMemoryScopeManager, ManualClock,
    NoopSessionService, ResourceDefinition, SessionClaimsProvider, StaticIssuer, UuidIdGenerator,
};
use oidc_authority::services::{
    AccessTokenService, IdentityTokenService, LogoutTokenService, ParStore, RefreshTokenService,
    TokenRegistry,
};
use oidc_authority::storage::InMemoryStorage;
use oidc_authority::validators::AuthorizationRequestValidator;
use oidc_authority::Config;

pub const PRIVATE_PEM: &str = include_str!("../../keys/private.pem");
pub const PUBLIC_PEM: &str = include_str!("../../keys/public.pem");

pub struct Harness {
    pub config: Config,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<InMemoryStorage>,
    pub clients: Arc<InMemoryClientRegistry>,
    pub formatter: Arc<JwtFormatter>,
    pub jwt_validator: Arc<JwtValidator>,
    pub par: Arc<ParStore>,
    pub registry: Arc<TokenRegistry>,
    pub access_tokens: Arc<AccessTokenService>,
    pub identity_tokens: Arc<IdentityTokenService>,
    pub refresh_tokens: Arc<RefreshTokenService>,
    pub logout_tokens: Arc<LogoutTokenService>,
    pub authorize: AuthorizationHandler,
    pub end_session: EndSessionHandler,
}

impl Harness {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let config = Config::default();
        let clock = Arc::new(ManualClock::new(now));
        let storage = Arc::new(InMemoryStorage::with_clock(clock.clone()));
        let clients = Arc::new(InMemoryClientRegistry::new());

        let keys: Arc<StaticKeyResolver> = Arc::new(StaticKeyResolver::new(vec![
            ServiceKey::from_rsa_pem(
                Some("test-rsa".to_string()),
                Algorithm::RS256,
                PRIVATE_PEM,
                PUBLIC_PEM,
            )
            .unwrap(),
            ServiceKey::from_rsa_pem(None, Algorithm::RS384, PRIVATE_PEM, PUBLIC_PEM).unwrap(),
        ]));

        let formatter = Arc::new(JwtFormatter::new(keys.clone()));
        let jwt_validator = Arc::new(JwtValidator::new(keys, clock.clone()));
        let issuer = Arc::new(StaticIssuer::new(config.issuer.clone()));
        let ids = Arc::new(UuidIdGenerator);

        let scopes = Arc::new(InMemoryScopeManager::standard());
        let mut resource_manager = InMemoryResourceManager::new();
        resource_manager.add(ResourceDefinition::with_scopes(
            "https://api.example.com",
            &["api.read", "api.write"],
        ));
        let resources = Arc::new(resource_manager);

        let par = Arc::new(ParStore::new(storage.clone()));
        let registry = Arc::new(TokenRegistry::new(storage.clone()));

        let access_tokens = Arc::new(AccessTokenService::new(
            clock.clone(),
            ids.clone(),
            issuer.clone(),
            formatter.clone(),
            jwt_validator.clone(),
        ));
        let identity_tokens = Arc::new(IdentityTokenService::new(
            clock.clone(),
            ids.clone(),
            issuer.clone(),
            formatter.clone(),
            Arc::new(SessionClaimsProvider),
            scopes.clone(),
        ));
        let refresh_tokens = Arc::new(RefreshTokenService::new(
            clock.clone(),
            ids.clone(),
            issuer.clone(),
            formatter.clone(),
            jwt_validator.clone(),
            registry.clone(),
        ));
        let logout_tokens = Arc::new(LogoutTokenService::new(
            clock.clone(),
            ids.clone(),
            issuer.clone(),
            formatter.clone(),
        ));

        let authorize = AuthorizationHandler::new(
            RequestFetcher::new(
                par.clone(),
                clients.clone(),
                clock.clone(),
                config.authorization_endpoint.clone(),
            ),
            AuthorizationRequestValidator::standard(clients.clone(), scopes, resources),
            AuthorizationProcessor::new(
                storage.clone(),
                access_tokens.clone(),
                identity_tokens.clone(),
                config.authorization_code_expires_in(),
            ),
        );

        let end_session = EndSessionHandler::new(
            EndSessionRequestValidator::standard(jwt_validator.clone(), clients.clone()),
            EndSessionProcessor::new(
                clients.clone(),
                Arc::new(NoopSessionService),
                issuer,
                Arc::new(DefaultLogoutNotifier::new(logout_tokens.clone())),
            ),
        );

        Self {
            config,
            clock,
            storage,
            clients,
            formatter,
            jwt_validator,
            par,
            registry,
            access_tokens,
            identity_tokens,
            refresh_tokens,
            logout_tokens,
            authorize,
            end_session,
        }
    }
}

pub const REDIRECT_URI: &str = "https://client.example/cb";

/// A confidential client registered for the code flow with PKCE disabled,
/// the shape most scenario tests start from.
pub fn code_client(client_id: &str) -> ClientInfo {
    let mut client = ClientInfo::new(client_id);
    client.redirect_uris = vec![REDIRECT_URI.to_string()];
    client.allowed_response_types = vec![vec!["code".to_string()]];
    client.pkce_required = Some(false);
    client
}

pub fn client_allowing(client_id: &str, combinations: &[&[&str]]) -> ClientInfo {
    let mut client = code_client(client_id);
    client.allowed_response_types = combinations
        .iter()
        .map(|combo| combo.iter().map(|p| p.to_string()).collect())
        .collect();
    client
}

pub fn session() -> AuthSession {
    let mut session = AuthSession::new("user_1", "session_1");
    session.email = Some("user@example.com".to_string());
    session.email_verified = Some(true);
    session
}

pub fn decode_jwt_payload(jwt: &str) -> serde_json::Value {
    let payload = jwt.split('.').nth(1).expect("not a compact JWT");
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap()
}

pub fn unwrap_request_error(error: AuthorizeError) -> RequestError {
    match error {
        AuthorizeError::Request(error) => error,
        other => panic!("expected a request error, got: {other:?}"),
    }
}
