//! The authorization request validator chain.
//!
//! Validators run in a fixed order and cooperate through the shared
//! [`ValidationContext`]; later validators rely on the side effects of
//! earlier ones (the redirect URI validator reads the client the client
//! validator resolved, and so on). The first validator to find a problem
//! ends the chain.

pub mod client;
pub mod context;
pub mod flow_type;
pub mod nonce;
pub mod pkce;
pub mod redirect_uri;
pub mod resource;
pub mod response_mode;
pub mod scope;

pub use client::ClientValidator;
pub use context::ValidationContext;
pub use flow_type::FlowTypeValidator;
pub use nonce::NonceValidator;
pub use pkce::PkceValidator;
pub use redirect_uri::RedirectUriValidator;
pub use resource::ResourceValidator;
pub use response_mode::ResponseModeValidator;
pub use scope::ScopeValidator;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RequestError;
use crate::models::{AuthorizationRequest, ResponseMode};
use crate::providers::{ClientInfoProvider, ResourceManager, ScopeManager};

/// One link of the validator chain. Returns `None` when the request passes
/// this validator's checks.
#[async_trait]
pub trait ContextValidator: Send + Sync {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError>;
}

/// Runs the composed chain against incoming requests.
pub struct AuthorizationRequestValidator {
    validators: Vec<Box<dyn ContextValidator>>,
}

impl AuthorizationRequestValidator {
    /// The standard chain, in its required order: client, redirect URI,
    /// flow type, response mode, nonce, PKCE, scope, resource.
    pub fn standard(
        clients: Arc<dyn ClientInfoProvider>,
        scopes: Arc<dyn ScopeManager>,
        resources: Arc<dyn ResourceManager>,
    ) -> Self {
        Self {
            validators: vec![
                Box::new(ClientValidator::new(clients)),
                Box::new(RedirectUriValidator),
                Box::new(FlowTypeValidator),
                Box::new(ResponseModeValidator),
                Box::new(NonceValidator),
                Box::new(PkceValidator),
                Box::new(ScopeValidator::new(scopes, resources.clone())),
                Box::new(ResourceValidator::new(resources)),
            ],
        }
    }

    /// Run the chain. On failure the error is returned with the redirect
    /// URI and response mode needed to deliver it, the response mode
    /// defaulting to the flow's natural mode (or `query` when no flow was
    /// established).
    pub async fn validate(
        &self,
        request: AuthorizationRequest,
    ) -> Result<ValidationContext, RequestError> {
        let mut context = ValidationContext::new(request);

        for validator in &self.validators {
            if let Some(mut error) = validator.validate(&mut context).await {
                if error.redirect_uri.is_none() {
                    error.redirect_uri = context.valid_redirect_uri().map(str::to_string);
                }
                if error.response_mode.is_none() {
                    error.response_mode =
                        Some(context.response_mode().unwrap_or(ResponseMode::Query));
                }
                return Err(error);
            }
        }

        Ok(context)
    }
}
