//! The authorization endpoint pipeline.
//!
//! A request passes three stages in fixed order: the [`RequestFetcher`]
//! turns pushed and JWT-secured requests into a plain
//! [`AuthorizationRequest`](crate::models::AuthorizationRequest), the
//! [`AuthorizationRequestValidator`](crate::validators::AuthorizationRequestValidator)
//! chain establishes the validated context, and the
//! [`AuthorizationProcessor`] issues the grant and shapes the response.

pub mod fetcher;
pub mod processor;

pub use fetcher::RequestFetcher;
pub use processor::AuthorizationProcessor;

use crate::error::{AuthorizeError, ErrorCode, RequestError};
use crate::models::{AuthSession, AuthorizationRequest, ResponseMode};
use crate::validators::AuthorizationRequestValidator;

/// A successful authorization response, ready for delivery through the
/// negotiated response mode.
#[derive(Debug, Clone)]
pub struct AuthorizationSuccess {
    pub redirect_uri: String,
    pub response_mode: ResponseMode,
    pub code: Option<String>,
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub token_type: Option<&'static str>,
    pub expires_in_secs: Option<i64>,
    pub state: Option<String>,
}

impl AuthorizationSuccess {
    /// The response parameters in their wire order.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(code) = &self.code {
            params.push(("code", code.clone()));
        }
        if let Some(id_token) = &self.id_token {
            params.push(("id_token", id_token.clone()));
        }
        if let Some(access_token) = &self.access_token {
            params.push(("access_token", access_token.clone()));
        }
        if let Some(token_type) = self.token_type {
            params.push(("token_type", token_type.to_string()));
        }
        if let Some(expires_in) = self.expires_in_secs {
            params.push(("expires_in", expires_in.to_string()));
        }
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        params
    }

    /// The redirect target for the `query` and `fragment` response modes.
    /// `form_post` responses render [`parameters`](Self::parameters) as form
    /// fields instead.
    pub fn location_url(&self) -> String {
        build_location_url(&self.redirect_uri, self.response_mode, &self.parameters())
    }
}

/// A client-visible error shaped for delivery.
#[derive(Debug, Clone)]
pub struct AuthorizationErrorResponse {
    pub error: ErrorCode,
    pub description: String,
    pub redirect_uri: Option<String>,
    pub response_mode: ResponseMode,
    pub state: Option<String>,
}

impl AuthorizationErrorResponse {
    pub fn new(error: &RequestError, state: Option<String>) -> Self {
        Self {
            error: error.code,
            description: error.description.clone(),
            redirect_uri: if error.can_redirect() {
                error.redirect_uri.clone()
            } else {
                None
            },
            response_mode: error.response_mode.unwrap_or(ResponseMode::Query),
            state,
        }
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("error", self.error.as_str().to_string()),
            ("error_description", self.description.clone()),
        ];
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        params
    }

    /// The redirect target, when the error may be redirected at all. An
    /// unauthorized client gets a plain error instead.
    pub fn location_url(&self) -> Option<String> {
        let redirect_uri = self.redirect_uri.as_deref()?;
        Some(build_location_url(
            redirect_uri,
            self.response_mode,
            &self.parameters(),
        ))
    }
}

fn build_location_url(
    redirect_uri: &str,
    response_mode: ResponseMode,
    params: &[(&'static str, String)],
) -> String {
    let encoded = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    match response_mode {
        ResponseMode::Query => {
            let separator = if redirect_uri.contains('?') { '&' } else { '?' };
            format!("{redirect_uri}{separator}{encoded}")
        }
        // form_post has no redirect URL of its own; the fields are posted
        // to the redirect URI by the rendered form.
        ResponseMode::Fragment | ResponseMode::FormPost => format!("{redirect_uri}#{encoded}"),
    }
}

/// The authorization endpoint: fetch, validate, process.
pub struct AuthorizationHandler {
    fetcher: RequestFetcher,
    validator: AuthorizationRequestValidator,
    processor: AuthorizationProcessor,
}

impl AuthorizationHandler {
    pub fn new(
        fetcher: RequestFetcher,
        validator: AuthorizationRequestValidator,
        processor: AuthorizationProcessor,
    ) -> Self {
        Self {
            fetcher,
            validator,
            processor,
        }
    }

    pub fn processor(&self) -> &AuthorizationProcessor {
        &self.processor
    }

    /// Authorize a request on behalf of an authenticated session.
    ///
    /// The session accumulates the client into its affected set so the
    /// end-session pipeline can later notify it.
    pub async fn authorize(
        &self,
        request: AuthorizationRequest,
        session: &mut AuthSession,
    ) -> Result<AuthorizationSuccess, AuthorizeError> {
        let request = self.fetcher.fetch(request).await?;
        let context = self.validator.validate(request).await?;
        self.processor.process(context, session).await
    }
}
