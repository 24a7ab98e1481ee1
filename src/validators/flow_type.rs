use async_trait::async_trait;

use crate::error::{ErrorCode, RequestError};
use crate::models::{response_types, FlowType, ResponseMode};

use super::{ContextValidator, ValidationContext};

/// Derives the flow type from the `response_type` composition and stamps
/// the flow's default response mode into the context.
///
/// The default always overwrites whatever the request carried; an explicit
/// `response_mode` is honoured only by the response-mode validator, which
/// runs later and may replace the default again. Error paths have no flow
/// to take a default from, so they fall back to `query`.
pub struct FlowTypeValidator;

#[async_trait]
impl ContextValidator for FlowTypeValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let parts = context.request.distinct_response_types();

        if parts.is_empty() {
            return Some(
                RequestError::new(ErrorCode::UnsupportedResponseType, "response_type is required")
                    .with_response_mode(ResponseMode::Query),
            );
        }

        if parts.iter().any(|part| {
            part != response_types::CODE
                && part != response_types::ID_TOKEN
                && part != response_types::TOKEN
        }) {
            return Some(
                RequestError::new(
                    ErrorCode::UnsupportedResponseType,
                    "response_type contains an unknown value",
                )
                .with_response_mode(ResponseMode::Query),
            );
        }

        let has_code = parts.iter().any(|p| p == response_types::CODE);
        let flow_type = match (has_code, parts.len()) {
            (true, 1) => FlowType::AuthorizationCode,
            (true, _) => FlowType::Hybrid,
            (false, _) => FlowType::Implicit,
        };

        if !context.client_info().allows_response_type(&parts) {
            return Some(
                RequestError::new(
                    ErrorCode::UnsupportedResponseType,
                    "response_type is not registered for this client",
                )
                .with_response_mode(ResponseMode::Query),
            );
        }

        context.set_flow_type(flow_type);
        context.set_response_mode(flow_type.default_response_mode());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorizationRequest, ClientInfo};
    use crate::validators::test_support::context_with_client;

    fn client_allowing(combinations: &[&[&str]]) -> ClientInfo {
        let mut client = ClientInfo::new("client_1");
        client.allowed_response_types = combinations
            .iter()
            .map(|combo| combo.iter().map(|p| p.to_string()).collect())
            .collect();
        client
    }

    fn context_for(response_type: Option<&[&str]>, client: ClientInfo) -> ValidationContext {
        context_with_client(
            AuthorizationRequest {
                response_type: response_type
                    .map(|parts| parts.iter().map(|p| p.to_string()).collect()),
                ..Default::default()
            },
            client,
        )
    }

    #[tokio::test]
    async fn test_code_selects_authorization_code_flow() {
        let mut context = context_for(Some(&["code"]), client_allowing(&[&["code"]]));
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.flow_type(), FlowType::AuthorizationCode);
        assert_eq!(context.response_mode(), Some(ResponseMode::Query));
    }

    #[tokio::test]
    async fn test_id_token_selects_implicit_flow() {
        let mut context = context_for(Some(&["id_token"]), client_allowing(&[&["id_token"]]));
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.flow_type(), FlowType::Implicit);
        assert_eq!(context.response_mode(), Some(ResponseMode::Fragment));
    }

    #[tokio::test]
    async fn test_id_token_token_selects_implicit_flow() {
        let mut context = context_for(
            Some(&["id_token", "token"]),
            client_allowing(&[&["id_token", "token"]]),
        );
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.flow_type(), FlowType::Implicit);
    }

    #[tokio::test]
    async fn test_code_plus_token_selects_hybrid_flow() {
        let mut context = context_for(
            Some(&["code", "id_token"]),
            client_allowing(&[&["code", "id_token"]]),
        );
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.flow_type(), FlowType::Hybrid);
        assert_eq!(context.response_mode(), Some(ResponseMode::Fragment));
    }

    #[tokio::test]
    async fn test_duplicate_components_collapse() {
        let mut context = context_for(
            Some(&["code", "CODE", "Code"]),
            client_allowing(&[&["code"]]),
        );
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.flow_type(), FlowType::AuthorizationCode);
    }

    #[tokio::test]
    async fn test_missing_response_type_rejected() {
        let mut context = context_for(None, client_allowing(&[&["code"]]));
        let error = FlowTypeValidator.validate(&mut context).await.unwrap();
        assert_eq!(error.code, ErrorCode::UnsupportedResponseType);
        assert_eq!(error.response_mode, Some(ResponseMode::Query));

        let mut context = context_for(Some(&[]), client_allowing(&[&["code"]]));
        let error = FlowTypeValidator.validate(&mut context).await.unwrap();
        assert_eq!(error.code, ErrorCode::UnsupportedResponseType);
    }

    #[tokio::test]
    async fn test_unknown_component_rejected() {
        let mut context = context_for(Some(&["code", "device"]), client_allowing(&[&["code"]]));
        let error = FlowTypeValidator.validate(&mut context).await.unwrap();
        assert_eq!(error.code, ErrorCode::UnsupportedResponseType);
    }

    #[tokio::test]
    async fn test_unregistered_combination_rejected() {
        let mut context = context_for(
            Some(&["code", "id_token"]),
            client_allowing(&[&["code"]]),
        );
        let error = FlowTypeValidator.validate(&mut context).await.unwrap();
        assert_eq!(error.code, ErrorCode::UnsupportedResponseType);
        assert_eq!(error.response_mode, Some(ResponseMode::Query));
    }

    #[tokio::test]
    async fn test_default_overwrites_requested_response_mode() {
        // The request asks for form_post; the flow default still wins here.
        // Only the response-mode validator, which runs later, may re-apply
        // the requested value.
        let mut context = context_with_client(
            AuthorizationRequest {
                response_type: Some(vec!["code".to_string()]),
                response_mode: Some("form_post".to_string()),
                ..Default::default()
            },
            client_allowing(&[&["code"]]),
        );
        assert!(FlowTypeValidator.validate(&mut context).await.is_none());
        assert_eq!(context.response_mode(), Some(ResponseMode::Query));
    }
}
