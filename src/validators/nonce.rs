use async_trait::async_trait;

use crate::error::{ErrorCode, RequestError};
use crate::models::response_types;

use super::{ContextValidator, ValidationContext};

/// Requires a nonce whenever the response will contain an identity token.
/// The nonce is an opaque string: whitespace is as good a value as any,
/// only the empty string counts as absent.
pub struct NonceValidator;

#[async_trait]
impl ContextValidator for NonceValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let needs_nonce = context
            .request
            .response_type
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|part| part == response_types::ID_TOKEN);

        if !needs_nonce {
            return None;
        }

        match context.request.nonce.as_deref() {
            Some(nonce) if !nonce.is_empty() => None,
            _ => Some(RequestError::new(
                ErrorCode::InvalidRequest,
                "nonce is required when response_type contains id_token",
            )),
        }
    }
}
