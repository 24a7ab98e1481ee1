//! Opaque token generation for authorization codes and pushed request URIs.

use rand::Rng;

/// Default length for generated opaque tokens.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Character set for opaque tokens. URL-safe so the values survive query
/// strings and `urn:` URIs untouched.
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random opaque token of the default length.
pub fn generate_token() -> String {
    generate_token_with_length(DEFAULT_TOKEN_LENGTH)
}

/// Generate a random opaque token of the given length.
pub fn generate_token_with_length(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_CHARSET.len());
            TOKEN_CHARSET[idx] as char
        })
        .collect()
}
