use async_trait::async_trait;

use crate::error::{ErrorCode, RequestError};

use super::{ContextValidator, ValidationContext};

/// The only code challenge method this validator treats specially.
pub const PKCE_METHOD_PLAIN: &str = "plain";

/// Guards the PKCE parameters of the request.
///
/// A present `code_challenge` with the explicit method `plain` is refused
/// for clients that disallow plain PKCE. An absent method defaults to plain
/// at exchange time but is deliberately not held against the client here,
/// and method matching is exact, so `PLAIN` or `S256` or any future method
/// passes through. A missing challenge is refused unless the client
/// explicitly opted out of PKCE.
pub struct PkceValidator;

#[async_trait]
impl ContextValidator for PkceValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        match context.request.code_challenge.as_deref() {
            Some(code_challenge) if !code_challenge.is_empty() => {
                if let Some(method) = context.request.code_challenge_method.as_deref() {
                    if method == PKCE_METHOD_PLAIN && !context.client_info().plain_pkce_allowed {
                        return Some(RequestError::new(
                            ErrorCode::InvalidRequest,
                            "the plain code_challenge_method is not allowed for this client",
                        ));
                    }
                }
                None
            }
            _ => match context.client_info().pkce_required {
                Some(false) => None,
                // None means required: only an explicit opt-out disables it.
                _ => Some(RequestError::new(
                    ErrorCode::InvalidRequest,
                    "code_challenge is required for this client",
                )),
            },
        }
    }
}
