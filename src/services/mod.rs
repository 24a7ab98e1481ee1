pub mod access_token;
pub mod identity_token;
pub mod logout_token;
pub mod par;
pub mod refresh_token;
pub mod token_registry;

pub use access_token::AccessTokenService;
pub use identity_token::IdentityTokenService;
pub use logout_token::LogoutTokenService;
pub use par::ParStore;
pub use refresh_token::{RefreshTokenGrant, RefreshTokenService};
pub use token_registry::TokenRegistry;

use chrono::{DateTime, Utc};

use crate::error::TokenError;
use crate::jwt::JwtClaims;

/// A token in its signed wire form, together with the metadata the issuing
/// grant keeps about it.
#[derive(Debug, Clone)]
pub struct IssuedJwt {
    pub value: String,
    pub jwt_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedJwt {
    pub fn expires_in_secs(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

pub(crate) fn timestamp_to_datetime(timestamp: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(timestamp, 0).ok_or(TokenError::InvalidToken)
}

/// Place a free-form claim into the payload, routing names that collide
/// with typed fields into those fields so the serialized JSON never carries
/// a duplicate key.
pub(crate) fn merge_additional_claim(
    payload: &mut JwtClaims,
    name: &str,
    value: serde_json::Value,
) {
    match name {
        "sub" => {
            if let serde_json::Value::String(sub) = value {
                payload.sub = Some(sub);
            }
        }
        "email" => {
            if let serde_json::Value::String(email) = value {
                payload.email = Some(email);
            }
        }
        "email_verified" => {
            if let serde_json::Value::Bool(verified) = value {
                payload.email_verified = Some(verified);
            }
        }
        _ => {
            payload.additional.insert(name.to_string(), value);
        }
    }
}
