//! Registered client metadata.
//!
//! Client registration storage is the embedding application's concern; the
//! engine only consumes the registered values through
//! [`ClientInfoProvider`](crate::providers::ClientInfoProvider).

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::{Deserialize, Serialize};

/// Default access token lifetime (1 hour).
pub const DEFAULT_ACCESS_TOKEN_EXPIRES_IN_SECS: i64 = 3600;

/// Default identity token lifetime (10 minutes).
pub const DEFAULT_IDENTITY_TOKEN_EXPIRES_IN_SECS: i64 = 600;

/// Default absolute refresh token lifetime (30 days).
pub const DEFAULT_REFRESH_TOKEN_ABSOLUTE_EXPIRES_IN_SECS: i64 = 30 * 24 * 3600;

/// Refresh token issuance policy for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenPolicy {
    /// Hard ceiling, measured from the original token's `iat`. Renewal never
    /// extends it.
    pub absolute_expires_in_secs: i64,

    /// Optional sliding window applied on each renewal, bounded by the
    /// absolute ceiling.
    pub sliding_expires_in_secs: Option<i64>,

    /// When false, a renewed-from token is recorded revoked before the
    /// replacement is issued.
    pub allow_reuse: bool,
}

impl Default for RefreshTokenPolicy {
    fn default() -> Self {
        Self {
            absolute_expires_in_secs: DEFAULT_REFRESH_TOKEN_ABSOLUTE_EXPIRES_IN_SECS,
            sliding_expires_in_secs: None,
            allow_reuse: false,
        }
    }
}

/// Back-channel logout registration for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackChannelLogout {
    /// Endpoint the authorization server POSTs the logout token to.
    pub uri: String,

    /// Whether logout tokens for this client must carry a `sid` claim.
    pub requires_session_id: bool,

    /// Logout token lifetime in seconds.
    pub logout_token_expires_in_secs: i64,
}

impl BackChannelLogout {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            requires_session_id: false,
            logout_token_expires_in_secs: 300,
        }
    }
}

/// Key material registered for validating JWTs the client itself issues
/// (request objects, client assertions).
#[derive(Debug, Clone)]
pub enum ClientKeyMaterial {
    /// An RSA/EC public key in PEM form.
    Pem(String),
    /// A shared secret for HMAC algorithms.
    Secret(Vec<u8>),
}

/// A single client signing key together with the algorithm it serves.
#[derive(Debug, Clone)]
pub struct ClientJwtKey {
    pub algorithm: Algorithm,
    pub material: ClientKeyMaterial,
}

impl ClientJwtKey {
    pub fn rsa_pem(algorithm: Algorithm, pem: impl Into<String>) -> Self {
        Self {
            algorithm,
            material: ClientKeyMaterial::Pem(pem.into()),
        }
    }

    pub fn secret(algorithm: Algorithm, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            material: ClientKeyMaterial::Secret(secret.into()),
        }
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match &self.material {
            ClientKeyMaterial::Pem(pem) => match self.algorithm {
                Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem.as_bytes()),
                _ => DecodingKey::from_rsa_pem(pem.as_bytes()),
            },
            ClientKeyMaterial::Secret(secret) => Ok(DecodingKey::from_secret(secret)),
        }
    }
}

/// Encryption key registered for a client. Presence of a key requests JWE
/// encryption of every token issued to the client; the key-management
/// algorithm names how the content key is wrapped.
#[derive(Debug, Clone)]
pub struct ClientEncryptionKey {
    pub key_management_algorithm: String,
    pub public_key_pem: String,
}

/// The registered client, as resolved by the client info provider.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: String,

    /// Registered redirect URIs. A request's `redirect_uri` must match one
    /// of these exactly (scheme/host compared case-insensitively).
    pub redirect_uris: Vec<String>,

    /// Registered post-logout redirect URIs for the end-session endpoint.
    pub post_logout_redirect_uris: Vec<String>,

    /// The `response_type` combinations the client may use, compared as
    /// unordered sets.
    pub allowed_response_types: Vec<Vec<String>>,

    /// Whether PKCE is required; `None` means required.
    pub pkce_required: Option<bool>,

    /// Whether the `plain` code challenge method is acceptable.
    pub plain_pkce_allowed: bool,

    /// Whether the client may request `offline_access`; `None` means denied.
    pub offline_access_allowed: Option<bool>,

    pub refresh_token: RefreshTokenPolicy,

    pub access_token_expires_in_secs: i64,

    pub identity_token_expires_in_secs: i64,

    pub identity_token_signed_response_algorithm: Algorithm,

    /// When true, user claims are always embedded in the identity token even
    /// if they would otherwise be deferred to the userinfo endpoint.
    pub force_user_claims_in_identity_token: bool,

    pub back_channel_logout: Option<BackChannelLogout>,

    /// Front-channel logout page the end-session response should embed for
    /// this client, if registered.
    pub front_channel_logout_uri: Option<String>,

    /// When true, issuing a grant without previously established consent is
    /// refused for non-interactive (`prompt=none`) requests.
    pub require_consent: bool,

    /// Keys for validating client-issued JWTs (request objects).
    pub jwt_validation_keys: Vec<ClientJwtKey>,

    /// Encryption key; presence turns issued tokens into JWEs.
    pub encryption_key: Option<ClientEncryptionKey>,
}

impl ClientInfo {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uris: Vec::new(),
            post_logout_redirect_uris: Vec::new(),
            allowed_response_types: vec![vec![super::request::response_types::CODE.to_string()]],
            pkce_required: None,
            plain_pkce_allowed: false,
            offline_access_allowed: None,
            refresh_token: RefreshTokenPolicy::default(),
            access_token_expires_in_secs: DEFAULT_ACCESS_TOKEN_EXPIRES_IN_SECS,
            identity_token_expires_in_secs: DEFAULT_IDENTITY_TOKEN_EXPIRES_IN_SECS,
            identity_token_signed_response_algorithm: Algorithm::RS256,
            force_user_claims_in_identity_token: false,
            back_channel_logout: None,
            front_channel_logout_uri: None,
            require_consent: false,
            jwt_validation_keys: Vec::new(),
            encryption_key: None,
        }
    }

    /// Whether the given deduplicated `response_type` combination is
    /// registered for this client. Comparison ignores component order and
    /// ASCII case.
    pub fn allows_response_type(&self, response_type: &[String]) -> bool {
        let mut requested: Vec<String> =
            response_type.iter().map(|p| p.to_ascii_lowercase()).collect();
        requested.sort();
        requested.dedup();

        self.allowed_response_types.iter().any(|allowed| {
            let mut registered: Vec<String> =
                allowed.iter().map(|p| p.to_ascii_lowercase()).collect();
            registered.sort();
            registered.dedup();
            registered == requested
        })
    }

    /// Whether the client registered the given post-logout redirect URI.
    pub fn allows_post_logout_redirect_uri(&self, uri: &str) -> bool {
        self.post_logout_redirect_uris.iter().any(|u| u == uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_response_type_ignores_order_and_case() {
        let mut client = ClientInfo::new("client_1");
        client.allowed_response_types = vec![
            vec!["code".to_string()],
            vec!["code".to_string(), "id_token".to_string()],
        ];

        assert!(client.allows_response_type(&["code".to_string()]));
        assert!(client.allows_response_type(&["id_token".to_string(), "code".to_string()]));
        assert!(client.allows_response_type(&["CODE".to_string(), "Id_Token".to_string()]));
        assert!(!client.allows_response_type(&["token".to_string()]));
        assert!(!client.allows_response_type(&[
            "code".to_string(),
            "id_token".to_string(),
            "token".to_string()
        ]));
    }

    #[test]
    fn test_defaults_are_restrictive() {
        let client = ClientInfo::new("client_1");
        // PKCE required unless explicitly disabled, offline access denied
        // unless explicitly granted.
        assert_eq!(client.pkce_required, None);
        assert!(!client.plain_pkce_allowed);
        assert_eq!(client.offline_access_allowed, None);
        assert!(!client.refresh_token.allow_reuse);
    }

    #[test]
    fn test_post_logout_redirect_uri_membership() {
        let mut client = ClientInfo::new("client_1");
        client.post_logout_redirect_uris = vec!["https://client.example/bye".to_string()];

        assert!(client.allows_post_logout_redirect_uri("https://client.example/bye"));
        assert!(!client.allows_post_logout_redirect_uri("https://client.example/other"));
    }
}
