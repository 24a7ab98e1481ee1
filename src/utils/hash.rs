//! Token hash binding values (`c_hash`, `at_hash`).
//!
//! The identity token binds a co-issued authorization code or access token
//! by embedding the base64url-encoded left half of a hash of its ASCII
//! representation. The hash function is paired with the identity token's
//! signing algorithm: SHA-256 for *256 algorithms, SHA-384 for *384,
//! SHA-512 for *512.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::Algorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Compute the left-half hash of `value` for the given signing algorithm.
///
/// Deterministic: equal `(algorithm, value)` pairs always yield the same
/// output.
pub fn half_hash(algorithm: Algorithm, value: &str) -> String {
    let digest = match algorithm {
        Algorithm::HS256 | Algorithm::RS256 | Algorithm::ES256 | Algorithm::PS256 => {
            Sha256::digest(value.as_bytes()).to_vec()
        }
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::ES384 | Algorithm::PS384 => {
            Sha384::digest(value.as_bytes()).to_vec()
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::EdDSA => {
            Sha512::digest(value.as_bytes()).to_vec()
        }
    };

    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}
