//! Service signing keys and their resolution.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

/// A service key pair usable for one signing algorithm.
pub struct ServiceKey {
    pub key_id: Option<String>,
    pub algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl ServiceKey {
    /// Build an RSA key pair from PEM-encoded material. Accepts PKCS#1 and
    /// PKCS#8 private keys.
    pub fn from_rsa_pem(
        key_id: Option<String>,
        algorithm: Algorithm,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            key_id,
            algorithm,
            encoding_key: EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?,
            decoding_key: DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?,
        })
    }

    /// Build a symmetric key for HMAC algorithms.
    pub fn from_secret(key_id: Option<String>, algorithm: Algorithm, secret: &[u8]) -> Self {
        Self {
            key_id,
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Resolution of service keys by algorithm. Key material may live remotely
/// (a JWKS document, a KMS), so resolution is asynchronous.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// The key the formatter signs with for the given algorithm, if any.
    async fn signing_key(&self, algorithm: Algorithm) -> Option<Arc<ServiceKey>>;

    /// All keys a token with the given algorithm may verify against.
    async fn validation_keys(&self, algorithm: Algorithm) -> Vec<Arc<ServiceKey>>;
}

/// A fixed in-process key set.
pub struct StaticKeyResolver {
    keys: Vec<Arc<ServiceKey>>,
}

impl StaticKeyResolver {
    pub fn new(keys: Vec<ServiceKey>) -> Self {
        Self {
            keys: keys.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn single(key: ServiceKey) -> Self {
        Self::new(vec![key])
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn signing_key(&self, algorithm: Algorithm) -> Option<Arc<ServiceKey>> {
        self.keys.iter().find(|k| k.algorithm == algorithm).cloned()
    }

    async fn validation_keys(&self, algorithm: Algorithm) -> Vec<Arc<ServiceKey>> {
        self.keys
            .iter()
            .filter(|k| k.algorithm == algorithm)
            .cloned()
            .collect()
    }
}
