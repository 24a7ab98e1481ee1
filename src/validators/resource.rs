use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ErrorCode, RequestError};
use crate::providers::ResourceManager;

use super::{ContextValidator, ValidationContext};

/// Resolves every requested resource indicator. A request without resources
/// passes silently; a single unknown resource fails the whole request.
pub struct ResourceValidator {
    resources: Arc<dyn ResourceManager>,
}

impl ResourceValidator {
    pub fn new(resources: Arc<dyn ResourceManager>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl ContextValidator for ResourceValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let mut resolved = Vec::with_capacity(context.request.resources.len());

        for uri in &context.request.resources {
            match self.resources.try_get(uri) {
                Some(definition) => resolved.push(definition),
                None => {
                    return Some(RequestError::new(
                        ErrorCode::InvalidTarget,
                        format!("unknown resource: {uri}"),
                    ))
                }
            }
        }

        context.set_resources(resolved);
        None
    }
}
