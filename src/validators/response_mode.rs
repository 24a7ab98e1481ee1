use async_trait::async_trait;
use tracing::warn;

use crate::error::{ErrorCode, RequestError};
use crate::models::ResponseMode;

use super::{ContextValidator, ValidationContext};

/// Applies an explicitly requested `response_mode`, provided it names a
/// known mode and is compatible with the flow. Token-bearing flows refuse
/// `query`: tokens must not end up in server logs and referrer headers.
/// An absent or empty value preserves the flow default stamped by the flow
/// type validator.
pub struct ResponseModeValidator;

#[async_trait]
impl ContextValidator for ResponseModeValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let raw = match context.request.response_mode.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => return None,
        };

        let response_mode = match ResponseMode::parse(raw) {
            Some(mode) => mode,
            None => {
                warn!(response_mode = %raw, "unsupported response_mode requested");
                return Some(RequestError::new(
                    ErrorCode::InvalidRequest,
                    format!("unsupported response_mode: {raw}"),
                ));
            }
        };

        let flow_type = context.flow_type();
        if !flow_type.allows_response_mode(response_mode) {
            warn!(
                response_mode = %raw,
                ?flow_type,
                "response_mode is not compatible with the requested flow"
            );
            return Some(RequestError::new(
                ErrorCode::InvalidRequest,
                format!("response_mode {raw} is not allowed for this flow"),
            ));
        }

        context.set_response_mode(response_mode);
        None
    }
}
