//! Signing (and optional encryption) of outbound tokens.

use std::sync::Arc;

use jsonwebtoken::Header;

use crate::error::TokenError;
use crate::models::ClientInfo;

use super::keys::KeyResolver;
use super::JsonWebToken;

/// JWE wrapping of a signed token. The JOSE encryption codec is an external
/// concern; deployments that register client encryption keys plug one in
/// here.
pub trait TokenEncryptor: Send + Sync {
    fn encrypt(&self, jws: &str, client: &ClientInfo) -> Result<String, TokenError>;
}

/// Turns a [`JsonWebToken`] into its compact wire form.
///
/// The signing key is resolved by the token's algorithm; a client registered
/// with an encryption key additionally gets the signed result wrapped by the
/// configured [`TokenEncryptor`].
pub struct JwtFormatter {
    keys: Arc<dyn KeyResolver>,
    encryptor: Option<Arc<dyn TokenEncryptor>>,
}

impl JwtFormatter {
    pub fn new(keys: Arc<dyn KeyResolver>) -> Self {
        Self {
            keys,
            encryptor: None,
        }
    }

    pub fn with_encryptor(mut self, encryptor: Arc<dyn TokenEncryptor>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    pub async fn format(
        &self,
        token: &JsonWebToken,
        client: &ClientInfo,
    ) -> Result<String, TokenError> {
        let key = self
            .keys
            .signing_key(token.algorithm)
            .await
            .ok_or(TokenError::NoSigningKey(token.algorithm))?;

        let mut header = Header::new(token.algorithm);
        header.typ = Some(token.token_type.to_string());
        header.kid = key.key_id.clone();

        let jws = jsonwebtoken::encode(&header, &token.payload, key.encoding_key())?;

        match (&client.encryption_key, &self.encryptor) {
            (Some(_), Some(encryptor)) => encryptor.encrypt(&jws, client),
            (Some(_), None) => Err(TokenError::EncryptionUnavailable),
            (None, _) => Ok(jws),
        }
    }
}
