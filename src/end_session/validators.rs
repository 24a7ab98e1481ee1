//! End-session request validation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ErrorCode, RequestError};
use crate::jwt::{JwtValidator, ValidationOptions};
use crate::providers::ClientInfoProvider;

use super::{EndSessionContext, EndSessionRequest};

/// One stage of the end-session validation chain.
#[async_trait]
pub trait EndSessionContextValidator: Send + Sync {
    async fn validate(&self, context: &mut EndSessionContext) -> Option<RequestError>;
}

/// Verifies the `id_token_hint` and reconciles it with `client_id`.
///
/// The hint is validated with the lifetime check disabled; an expired
/// identity token still proves which client the session was issued to.
/// When the request has no `client_id`, the token's single audience
/// supplies it; when it has one, it must appear among the audiences.
pub struct IdTokenHintValidator {
    validator: Arc<JwtValidator>,
}

impl IdTokenHintValidator {
    pub fn new(validator: Arc<JwtValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl EndSessionContextValidator for IdTokenHintValidator {
    async fn validate(&self, context: &mut EndSessionContext) -> Option<RequestError> {
        let hint = match context.request.id_token_hint.as_deref() {
            Some(hint) if !hint.is_empty() => hint,
            _ => return None,
        };

        let options = ValidationOptions {
            disable_lifetime_check: true,
            ..Default::default()
        };
        let validated = match self.validator.validate(hint, &options).await {
            Ok(validated) => validated,
            Err(error) => {
                warn!(%error, "id_token_hint validation failed");
                return Some(RequestError::new(
                    ErrorCode::InvalidRequest,
                    "id_token_hint is not a valid token",
                ));
            }
        };

        let audiences = validated.claims.audiences().to_vec();
        match context.request.client_id.as_deref() {
            None => {
                if audiences.len() != 1 {
                    return Some(RequestError::new(
                        ErrorCode::InvalidRequest,
                        "client_id cannot be derived from the id_token_hint audiences",
                    ));
                }
                context.request.client_id = Some(audiences[0].clone());
            }
            Some(client_id) => {
                // Ordinal comparison against the audience set.
                if !audiences.iter().any(|aud| aud == client_id) {
                    return Some(RequestError::new(
                        ErrorCode::InvalidRequest,
                        "client_id does not match the id_token_hint audience",
                    ));
                }
            }
        }

        context.id_token = Some(validated.claims);
        None
    }
}

/// Checks the requested `post_logout_redirect_uri` against the client's
/// registration. Only runs when the request names one; resolving the
/// client is a precondition, and failing to resolve one is the client's
/// problem, not ours.
pub struct PostLogoutRedirectUrisValidator {
    clients: Arc<dyn ClientInfoProvider>,
}

impl PostLogoutRedirectUrisValidator {
    pub fn new(clients: Arc<dyn ClientInfoProvider>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl EndSessionContextValidator for PostLogoutRedirectUrisValidator {
    async fn validate(&self, context: &mut EndSessionContext) -> Option<RequestError> {
        let post_logout_redirect_uri = match context.request.post_logout_redirect_uri.as_deref() {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => return None,
        };

        if context.client_info.is_none() {
            let client = match context.request.client_id.as_deref() {
                Some(client_id) => self.clients.try_find(client_id).await.ok().flatten(),
                None => None,
            };
            context.client_info = client;
        }

        let client = match &context.client_info {
            Some(client) => client,
            None => {
                return Some(RequestError::new(
                    ErrorCode::UnauthorizedClient,
                    "post_logout_redirect_uri requires a resolved client",
                ))
            }
        };

        if !client.allows_post_logout_redirect_uri(&post_logout_redirect_uri) {
            warn!(
                client_id = %client.client_id,
                %post_logout_redirect_uri,
                "post_logout_redirect_uri does not match any registered URI"
            );
            return Some(RequestError::new(
                ErrorCode::InvalidRequest,
                "post_logout_redirect_uri does not match any registered URI",
            ));
        }

        None
    }
}

/// Runs the end-session validation stages in order.
pub struct EndSessionRequestValidator {
    validators: Vec<Box<dyn EndSessionContextValidator>>,
}

impl EndSessionRequestValidator {
    pub fn standard(
        jwt_validator: Arc<JwtValidator>,
        clients: Arc<dyn ClientInfoProvider>,
    ) -> Self {
        Self {
            validators: vec![
                Box::new(IdTokenHintValidator::new(jwt_validator)),
                Box::new(PostLogoutRedirectUrisValidator::new(clients)),
            ],
        }
    }

    pub async fn validate(
        &self,
        request: EndSessionRequest,
    ) -> Result<EndSessionContext, RequestError> {
        let mut context = EndSessionContext::new(request);
        for validator in &self.validators {
            if let Some(error) = validator.validate(&mut context).await {
                return Err(error);
            }
        }
        Ok(context)
    }
}
