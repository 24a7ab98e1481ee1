//! Storage key construction.
//!
//! The key factory is the single source of truth for key format. Every
//! component routes key construction through it, so a writer and a reader
//! can never disagree on where an entry lives. Keys embed their input in
//! its unmodified textual form.

/// Namespaced storage keys.
pub struct KeyFactory;

impl KeyFactory {
    const PREFIX: &'static str = "oidc";

    /// Key of a recorded JWT status, by `jti`.
    pub fn jwt_status(jwt_id: &str) -> String {
        format!("{}:jwt-status:{}", Self::PREFIX, jwt_id)
    }

    /// Key of a pushed authorization request, by its `request_uri`.
    pub fn pushed_request(request_uri: &str) -> String {
        format!("{}:par:{}", Self::PREFIX, request_uri)
    }

    /// Key of a persisted authorization grant, by authorization code.
    pub fn authorization_grant(code: &str) -> String {
        format!("{}:grant:{}", Self::PREFIX, code)
    }
}
