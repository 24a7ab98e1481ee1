use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Scope names with meaning to the engine itself.
pub mod standard_scopes {
    pub const OPENID: &str = "openid";
    pub const PROFILE: &str = "profile";
    pub const EMAIL: &str = "email";
    pub const ADDRESS: &str = "address";
    pub const PHONE: &str = "phone";
    pub const OFFLINE_ACCESS: &str = "offline_access";
}

/// A registered scope and the claim types it unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    pub scope: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claim_types: Vec<String>,
}

impl ScopeDefinition {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            claim_types: Vec::new(),
        }
    }

    pub fn with_claims(scope: impl Into<String>, claim_types: &[&str]) -> Self {
        Self {
            scope: scope.into(),
            claim_types: claim_types.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Registry of the scopes this authorization server knows about.
pub trait ScopeManager: Send + Sync {
    fn get(&self, scope: &str) -> Option<ScopeDefinition>;
}

/// In-memory scope registry, pre-seeded with the OpenID Connect standard
/// scopes.
#[derive(Debug, Clone)]
pub struct InMemoryScopeManager {
    scopes: HashMap<String, ScopeDefinition>,
}

impl InMemoryScopeManager {
    pub fn new() -> Self {
        Self {
            scopes: HashMap::new(),
        }
    }

    /// The standard scope set: `openid`, `profile`, `email`, `address`,
    /// `phone` and `offline_access`.
    pub fn standard() -> Self {
        use standard_scopes::*;

        let mut manager = Self::new();
        manager.add(ScopeDefinition::with_claims(OPENID, &["sub"]));
        manager.add(ScopeDefinition::with_claims(
            PROFILE,
            &[
                "name",
                "family_name",
                "given_name",
                "middle_name",
                "nickname",
                "preferred_username",
                "picture",
                "website",
                "gender",
                "birthdate",
                "zoneinfo",
                "locale",
                "updated_at",
            ],
        ));
        manager.add(ScopeDefinition::with_claims(EMAIL, &["email", "email_verified"]));
        manager.add(ScopeDefinition::with_claims(ADDRESS, &["address"]));
        manager.add(ScopeDefinition::with_claims(
            PHONE,
            &["phone_number", "phone_number_verified"],
        ));
        manager.add(ScopeDefinition::new(OFFLINE_ACCESS));
        manager
    }

    pub fn add(&mut self, definition: ScopeDefinition) {
        self.scopes.insert(definition.scope.clone(), definition);
    }
}

impl Default for InMemoryScopeManager {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScopeManager for InMemoryScopeManager {
    fn get(&self, scope: &str) -> Option<ScopeDefinition> {
        self.scopes.get(scope).cloned()
    }
}
