//! Resolution of pushed and JWT-secured authorization requests.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ErrorCode, RequestError};
use crate::jwt::ClientJwtValidator;
use crate::models::AuthorizationRequest;
use crate::providers::{ClientInfoProvider, Clock};
use crate::services::par::{self, ParStore};

const REMOTE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Dereferences `request_uri` (pushed requests and remote request objects)
/// and `request` (inline request objects) into a plain request the
/// validator chain can work on. Requests using neither pass through
/// untouched.
pub struct RequestFetcher {
    par: Arc<ParStore>,
    clients: Arc<dyn ClientInfoProvider>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    authorization_endpoint: String,
}

impl RequestFetcher {
    pub fn new(
        par: Arc<ParStore>,
        clients: Arc<dyn ClientInfoProvider>,
        clock: Arc<dyn Clock>,
        authorization_endpoint: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REMOTE_FETCH_TIMEOUT)
            .build()
            .expect("failed to build the request_uri HTTP client");

        Self {
            par,
            clients,
            clock,
            http,
            authorization_endpoint: authorization_endpoint.into(),
        }
    }

    pub async fn fetch(
        &self,
        request: AuthorizationRequest,
    ) -> Result<AuthorizationRequest, RequestError> {
        if let Some(request_uri) = request.request_uri.clone() {
            if par::is_pushed_request_uri(&request_uri) {
                return self.fetch_pushed(&request, &request_uri).await;
            }
            let request_object = self.fetch_remote(&request_uri).await?;
            return self.apply_request_object(&request, &request_object).await;
        }

        if let Some(request_object) = request.request.clone() {
            return self.apply_request_object(&request, &request_object).await;
        }

        Ok(request)
    }

    /// Consume a pushed request. Consumption is single-use: a second
    /// arrival with the same URI finds nothing.
    async fn fetch_pushed(
        &self,
        request: &AuthorizationRequest,
        request_uri: &str,
    ) -> Result<AuthorizationRequest, RequestError> {
        let stored = self
            .par
            .try_get(request_uri, true)
            .await
            .map_err(|error| {
                warn!(%request_uri, %error, "pushed request lookup failed");
                RequestError::new(
                    ErrorCode::InvalidRequestUri,
                    "request_uri could not be resolved",
                )
            })?
            .ok_or_else(|| {
                RequestError::new(
                    ErrorCode::InvalidRequestUri,
                    "unknown or expired request_uri",
                )
            })?;

        if let (Some(outer), Some(stored_id)) = (&request.client_id, &stored.client_id) {
            if outer != stored_id {
                return Err(RequestError::new(
                    ErrorCode::InvalidRequestUri,
                    "request_uri was pushed by a different client",
                ));
            }
        }

        debug!(%request_uri, "resolved pushed authorization request");
        Ok(stored)
    }

    async fn fetch_remote(&self, request_uri: &str) -> Result<String, RequestError> {
        let response = self
            .http
            .get(request_uri)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|error| {
                warn!(%request_uri, %error, "request_uri dereference failed");
                RequestError::new(
                    ErrorCode::InvalidRequestUri,
                    "request_uri could not be dereferenced",
                )
            })?;

        response.text().await.map_err(|error| {
            warn!(%request_uri, %error, "request_uri body could not be read");
            RequestError::new(
                ErrorCode::InvalidRequestUri,
                "request_uri could not be dereferenced",
            )
        })
    }

    /// Validate a request object and unfold its claims into the request
    /// model. Each fetch uses a fresh [`ClientJwtValidator`]: the validator
    /// instance is bound to a single issuer.
    async fn apply_request_object(
        &self,
        outer: &AuthorizationRequest,
        request_object: &str,
    ) -> Result<AuthorizationRequest, RequestError> {
        let validator = ClientJwtValidator::new(
            self.clients.clone(),
            self.clock.clone(),
            self.authorization_endpoint.clone(),
        );

        let (client, claims) = validator.validate(request_object).await.map_err(|error| {
            warn!(%error, "request object validation failed");
            RequestError::new(
                ErrorCode::InvalidRequestObject,
                "request object validation failed",
            )
        })?;

        let value = serde_json::to_value(&claims).map_err(|_| {
            RequestError::new(
                ErrorCode::InvalidRequestObject,
                "request object claims are malformed",
            )
        })?;
        let mut model: AuthorizationRequest = serde_json::from_value(value).map_err(|_| {
            RequestError::new(
                ErrorCode::InvalidRequestObject,
                "request object claims are malformed",
            )
        })?;

        if model.client_id.is_none() {
            model.client_id = Some(client.client_id.clone());
        }
        if let Some(outer_id) = &outer.client_id {
            if model.client_id.as_deref() != Some(outer_id.as_str()) {
                return Err(RequestError::new(
                    ErrorCode::InvalidRequestObject,
                    "request object client_id does not match the request",
                ));
            }
        }

        Ok(model)
    }
}
