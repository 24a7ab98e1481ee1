/// Source of the `iss` claim stamped into every issued token.
pub trait IssuerProvider: Send + Sync {
    fn issuer(&self) -> &str;
}

/// A fixed issuer identifier.
#[derive(Debug, Clone)]
pub struct StaticIssuer(pub String);

impl StaticIssuer {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self(issuer.into())
    }
}

impl IssuerProvider for StaticIssuer {
    fn issuer(&self) -> &str {
        &self.0
    }
}
