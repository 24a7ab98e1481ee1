//! JSON Web Token model, signing and validation.
//!
//! The engine issues four token kinds, distinguished by the JOSE `typ`
//! header: `at+jwt` (access), `id+jwt` (identity), `rt+jwt` (refresh) and
//! `logout+jwt` (logout). All are compact JWS strings, optionally wrapped
//! into a JWE for clients registered with encryption keys.

pub mod formatter;
pub mod keys;
pub mod validator;

pub use formatter::{JwtFormatter, TokenEncryptor};
pub use keys::{KeyResolver, ServiceKey, StaticKeyResolver};
pub use validator::{ClientJwtValidator, JwtValidator, ValidatedToken, ValidationOptions};

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Deserializer, Serialize};

/// JOSE `typ` header values of the tokens this server issues.
pub mod token_types {
    pub const ACCESS: &str = "at+jwt";
    pub const IDENTITY: &str = "id+jwt";
    pub const REFRESH: &str = "rt+jwt";
    pub const LOGOUT: &str = "logout+jwt";
}

/// The back-channel logout event URI required in logout tokens.
pub const BACKCHANNEL_LOGOUT_EVENT: &str = "http://schemas.openid.net/event/backchannel-logout";

/// JWT payload. Registered claims are typed; everything else rides in the
/// flattened `additional` map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_audiences"
    )]
    pub aud: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_scope"
    )]
    pub scope: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

impl JwtClaims {
    pub fn audiences(&self) -> &[String] {
        self.aud.as_deref().unwrap_or_default()
    }

    pub fn has_audience(&self, audience: &str) -> bool {
        self.audiences().iter().any(|a| a == audience)
    }
}

/// An unsigned token: the `typ` header, the signing algorithm the formatter
/// must find a key for, and the payload.
#[derive(Debug, Clone)]
pub struct JsonWebToken {
    pub token_type: &'static str,
    pub algorithm: Algorithm,
    pub payload: JwtClaims,
}

/// `aud` arrives either as a single string or as an array.
fn deserialize_opt_audiences<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
        OneOrMany::One(aud) => vec![aud],
        OneOrMany::Many(auds) => auds,
    }))
}

/// `scope` is an array in our own tokens but a space-delimited string in
/// client-issued request objects.
fn deserialize_opt_scope<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScopeForm {
        Delimited(String),
        List(Vec<String>),
    }

    Ok(Option::<ScopeForm>::deserialize(deserializer)?.map(|value| match value {
        ScopeForm::Delimited(scope) => scope
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect(),
        ScopeForm::List(scopes) => scopes,
    }))
}
