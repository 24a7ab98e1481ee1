use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::scopes::ScopeDefinition;

/// A protected resource (RFC 8707 resource indicator) and the scopes it
/// defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// The resource identifier URI.
    pub resource: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<ScopeDefinition>,
}

impl ResourceDefinition {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes(resource: impl Into<String>, scopes: &[&str]) -> Self {
        Self {
            resource: resource.into(),
            scopes: scopes.iter().map(|s| ScopeDefinition::new(*s)).collect(),
        }
    }

    pub fn has_scope(&self, scope: &str) -> Option<ScopeDefinition> {
        self.scopes.iter().find(|s| s.scope == scope).cloned()
    }
}

/// Registry of the resources requests may target.
pub trait ResourceManager: Send + Sync {
    fn try_get(&self, resource: &str) -> Option<ResourceDefinition>;
}

/// In-memory resource registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceManager {
    resources: HashMap<String, ResourceDefinition>,
}

impl InMemoryResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, definition: ResourceDefinition) {
        self.resources
            .insert(definition.resource.clone(), definition);
    }
}

impl ResourceManager for InMemoryResourceManager {
    fn try_get(&self, resource: &str) -> Option<ResourceDefinition> {
        self.resources.get(resource).cloned()
    }
}
