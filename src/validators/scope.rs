use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ErrorCode, RequestError};
use crate::models::FlowType;
use crate::providers::scopes::standard_scopes;
use crate::providers::{ResourceManager, ScopeDefinition, ScopeManager};

use super::{ContextValidator, ValidationContext};

/// Resolves every requested scope to its definition, falling back to the
/// scopes attached to the requested resources when the scope registry does
/// not know a name.
///
/// `offline_access` is policy-checked first so its diagnostic is not
/// shadowed by an unknown-scope diagnostic: it needs a flow that can
/// actually deliver a refresh token and a client allowed to hold one.
pub struct ScopeValidator {
    scopes: Arc<dyn ScopeManager>,
    resources: Arc<dyn ResourceManager>,
}

impl ScopeValidator {
    pub fn new(scopes: Arc<dyn ScopeManager>, resources: Arc<dyn ResourceManager>) -> Self {
        Self { scopes, resources }
    }

    fn resolve(&self, context: &ValidationContext, scope: &str) -> Option<ScopeDefinition> {
        if let Some(definition) = self.scopes.get(scope) {
            return Some(definition);
        }

        context
            .request
            .resources
            .iter()
            .find_map(|uri| self.resources.try_get(uri)?.has_scope(scope))
    }
}

#[async_trait]
impl ContextValidator for ScopeValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        if context
            .request
            .scope
            .iter()
            .any(|s| s == standard_scopes::OFFLINE_ACCESS)
        {
            let offline_allowed = context.client_info().offline_access_allowed == Some(true);
            if context.flow_type() == FlowType::Implicit || !offline_allowed {
                return Some(RequestError::new(
                    ErrorCode::InvalidScope,
                    "offline_access is not available for this request",
                ));
            }
        }

        // Resolution preserves request order, duplicates included.
        let mut resolved = Vec::with_capacity(context.request.scope.len());
        for scope in &context.request.scope {
            match self.resolve(context, scope) {
                Some(definition) => resolved.push(definition),
                None => {
                    return Some(RequestError::new(
                        ErrorCode::InvalidScope,
                        format!("unknown scope: {scope}"),
                    ))
                }
            }
        }

        context.set_scope(resolved);
        None
    }
}
