//! The shared state the validator chain accumulates.

use crate::models::{AuthorizationRequest, ClientInfo, FlowType, ResponseMode};
use crate::providers::{ResourceDefinition, ScopeDefinition};

/// Mutable bag the validators fill in as they run.
///
/// `client_info` and `flow_type` are write-once and their getters panic when
/// read before a validator has set them; reading them early is a bug in the
/// chain's composition, not a request error. `response_mode` is rewritable:
/// the flow validator stamps the flow's default and the response-mode
/// validator may replace it with the request's explicit choice.
#[derive(Debug)]
pub struct ValidationContext {
    pub request: AuthorizationRequest,
    client_info: Option<ClientInfo>,
    flow_type: Option<FlowType>,
    response_mode: Option<ResponseMode>,
    valid_redirect_uri: Option<String>,
    scope: Vec<ScopeDefinition>,
    resources: Vec<ResourceDefinition>,
}

impl ValidationContext {
    pub fn new(request: AuthorizationRequest) -> Self {
        Self {
            request,
            client_info: None,
            flow_type: None,
            response_mode: None,
            valid_redirect_uri: None,
            scope: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn client_info(&self) -> &ClientInfo {
        self.client_info
            .as_ref()
            .expect("client_info read before the client validator ran")
    }

    pub fn set_client_info(&mut self, client_info: ClientInfo) {
        assert!(
            self.client_info.is_none(),
            "client_info must only be set once"
        );
        self.client_info = Some(client_info);
    }

    pub fn has_client_info(&self) -> bool {
        self.client_info.is_some()
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
            .expect("flow_type read before the flow type validator ran")
    }

    pub fn set_flow_type(&mut self, flow_type: FlowType) {
        assert!(self.flow_type.is_none(), "flow_type must only be set once");
        self.flow_type = Some(flow_type);
    }

    pub fn response_mode(&self) -> Option<ResponseMode> {
        self.response_mode
    }

    pub fn set_response_mode(&mut self, response_mode: ResponseMode) {
        self.response_mode = Some(response_mode);
    }

    pub fn valid_redirect_uri(&self) -> Option<&str> {
        self.valid_redirect_uri.as_deref()
    }

    pub fn set_valid_redirect_uri(&mut self, redirect_uri: String) {
        self.valid_redirect_uri = Some(redirect_uri);
    }

    pub fn scope(&self) -> &[ScopeDefinition] {
        &self.scope
    }

    pub fn scope_values(&self) -> Vec<String> {
        self.scope.iter().map(|s| s.scope.clone()).collect()
    }

    pub fn set_scope(&mut self, scope: Vec<ScopeDefinition>) {
        self.scope = scope;
    }

    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }

    pub fn resource_values(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.resource.clone()).collect()
    }

    pub fn set_resources(&mut self, resources: Vec<ResourceDefinition>) {
        self.resources = resources;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "client_info read before")]
    fn test_client_info_before_set_panics() {
        let context = ValidationContext::new(AuthorizationRequest::default());
        let _ = context.client_info();
    }

    #[test]
    #[should_panic(expected = "flow_type read before")]
    fn test_flow_type_before_set_panics() {
        let context = ValidationContext::new(AuthorizationRequest::default());
        let _ = context.flow_type();
    }

    #[test]
    #[should_panic(expected = "only be set once")]
    fn test_client_info_is_write_once() {
        let mut context = ValidationContext::new(AuthorizationRequest::default());
        context.set_client_info(ClientInfo::new("client_1"));
        context.set_client_info(ClientInfo::new("client_2"));
    }

    #[test]
    fn test_response_mode_is_rewritable() {
        let mut context = ValidationContext::new(AuthorizationRequest::default());
        assert_eq!(context.response_mode(), None);

        context.set_response_mode(ResponseMode::Fragment);
        context.set_response_mode(ResponseMode::FormPost);
        assert_eq!(context.response_mode(), Some(ResponseMode::FormPost));
    }
}
