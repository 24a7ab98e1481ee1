//! The end-session (RP-initiated logout) pipeline.
//!
//! A logout request is validated (id_token_hint verification, client
//! reconciliation, post-logout redirect URI checks), the session is
//! terminated, and every client that obtained a grant during the session is
//! notified concurrently, by back-channel POST and front-channel iframe.

pub mod notifier;
pub mod processor;
pub mod validators;

pub use notifier::{DefaultLogoutNotifier, LogoutContext, LogoutNotifier};
pub use processor::EndSessionProcessor;
pub use validators::{
    EndSessionContextValidator, EndSessionRequestValidator, IdTokenHintValidator,
    PostLogoutRedirectUrisValidator,
};

use serde::{Deserialize, Serialize};

use crate::error::EndSessionError;
use crate::jwt::JwtClaims;
use crate::models::{AuthSession, ClientInfo};

/// The raw end-session request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_logout_redirect_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_locales: Option<String>,
}

/// State accumulated while validating an end-session request. Unlike the
/// authorization context, the request itself is corrected in place here:
/// a missing `client_id` is filled in from the id_token_hint audience.
#[derive(Debug, Default)]
pub struct EndSessionContext {
    pub request: EndSessionRequest,
    pub client_info: Option<ClientInfo>,
    pub id_token: Option<JwtClaims>,
}

impl EndSessionContext {
    pub fn new(request: EndSessionRequest) -> Self {
        Self {
            request,
            client_info: None,
            id_token: None,
        }
    }
}

/// The end-session outcome handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSessionResponse {
    /// Where to send the user agent afterwards, with `state` already
    /// appended. `None` when the request did not name a destination.
    pub post_logout_redirect_uri: Option<String>,

    /// Front-channel logout pages to embed, one per front-channel client
    /// that shared the session.
    pub front_channel_logout_uris: Vec<String>,
}

/// The end-session endpoint: validate, then terminate and notify.
pub struct EndSessionHandler {
    validator: EndSessionRequestValidator,
    processor: EndSessionProcessor,
}

impl EndSessionHandler {
    pub fn new(validator: EndSessionRequestValidator, processor: EndSessionProcessor) -> Self {
        Self {
            validator,
            processor,
        }
    }

    /// Terminate the given session as requested. `session` is the active
    /// authentication session, if any; logging out without one is not an
    /// error and simply redirects.
    pub async fn end_session(
        &self,
        request: EndSessionRequest,
        session: Option<AuthSession>,
    ) -> Result<EndSessionResponse, EndSessionError> {
        let context = self.validator.validate(request).await?;
        self.processor.process(context, session).await
    }
}
