use serde::{Deserialize, Serialize};

/// Explicitly recorded state of a JWT, keyed by `jti` in the token registry.
///
/// `Unknown` is the default and means no state has been recorded; it is what
/// the registry answers for a `jti` it has never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonWebTokenStatus {
    #[default]
    Unknown,
    Used,
    Revoked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(JsonWebTokenStatus::default(), JsonWebTokenStatus::Unknown);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&JsonWebTokenStatus::Revoked).unwrap();
        let back: JsonWebTokenStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, JsonWebTokenStatus::Revoked);
    }
}
