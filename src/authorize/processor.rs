//! Grant issuance for validated authorization requests.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::error::{AuthorizeError, ErrorCode, RequestError};
use crate::models::{
    prompts, response_types, AuthSession, AuthorizationContext, AuthorizedGrant, IssuedToken,
};
use crate::services::{AccessTokenService, IdentityTokenService};
use crate::storage::{put_json, take_json, KeyFactory, Storage, StorageOptions};
use crate::utils::opaque;

use super::AuthorizationSuccess;

/// Length of issued authorization codes.
const AUTHORIZATION_CODE_LENGTH: usize = 48;

/// Issues the artifacts a validated request asks for (authorization code,
/// access token, identity token), persists the grant behind the code and
/// shapes the response.
pub struct AuthorizationProcessor {
    storage: Arc<dyn Storage>,
    access_tokens: Arc<AccessTokenService>,
    identity_tokens: Arc<IdentityTokenService>,
    code_expires_in: Duration,
}

impl AuthorizationProcessor {
    pub fn new(
        storage: Arc<dyn Storage>,
        access_tokens: Arc<AccessTokenService>,
        identity_tokens: Arc<IdentityTokenService>,
        code_expires_in: Duration,
    ) -> Self {
        Self {
            storage,
            access_tokens,
            identity_tokens,
            code_expires_in,
        }
    }

    pub async fn process(
        &self,
        context: crate::validators::ValidationContext,
        session: &mut AuthSession,
    ) -> Result<AuthorizationSuccess, AuthorizeError> {
        // Both accessors panic if the chain did not run to completion; a
        // context in that state must never reach this point.
        let client = context.client_info().clone();
        let flow_type = context.flow_type();
        let response_mode = context
            .response_mode()
            .unwrap_or_else(|| flow_type.default_response_mode());
        let redirect_uri = context
            .valid_redirect_uri()
            .expect("processor requires a validated redirect_uri")
            .to_string();

        let request = &context.request;

        if client.require_consent && request.has_prompt(prompts::NONE) {
            let mut error =
                RequestError::new(ErrorCode::ConsentRequired, "user consent is required");
            error.redirect_uri = Some(redirect_uri);
            error.response_mode = Some(response_mode);
            return Err(error.into());
        }

        session.add_affected_client(&client.client_id);

        let auth_context = AuthorizationContext {
            client_id: client.client_id.clone(),
            scope: context.scope_values(),
            requested_claims: request.claims.clone(),
            redirect_uri: Some(redirect_uri.clone()),
            nonce: request.nonce.clone(),
            code_challenge: request.code_challenge.clone(),
            code_challenge_method: request.code_challenge_method.clone(),
            resources: (!request.resources.is_empty()).then(|| request.resources.clone()),
            x509_thumbprint: None,
        };

        let wants_code = request.has_response_type(response_types::CODE);
        let wants_token = request.has_response_type(response_types::TOKEN);
        let wants_id_token = request.has_response_type(response_types::ID_TOKEN);

        let mut issued_tokens: Vec<IssuedToken> = Vec::new();

        let access_token = if wants_token {
            let issued = self
                .access_tokens
                .create(session, &auth_context, &client)
                .await?;
            issued_tokens.push(IssuedToken {
                jwt_id: issued.jwt_id.clone(),
                expires_at: issued.expires_at,
            });
            Some(issued)
        } else {
            None
        };

        let code = wants_code.then(|| opaque::generate_token_with_length(AUTHORIZATION_CODE_LENGTH));

        let id_token = if wants_id_token {
            // The identity token is the user's only claims channel when the
            // response carries neither a code nor an access token.
            let with_user_claims = !wants_code && !wants_token;
            let issued = self
                .identity_tokens
                .create(
                    session,
                    &auth_context,
                    &client,
                    with_user_claims,
                    code.as_deref(),
                    access_token.as_ref().map(|t| t.value.as_str()),
                )
                .await?;
            match issued {
                Some(issued) => {
                    issued_tokens.push(IssuedToken {
                        jwt_id: issued.jwt_id.clone(),
                        expires_at: issued.expires_at,
                    });
                    Some(issued)
                }
                None => {
                    warn!(
                        client_id = %client.client_id,
                        subject = %session.subject,
                        "identity token withheld: no user claims available"
                    );
                    None
                }
            }
        } else {
            None
        };

        if let Some(code) = &code {
            let grant = AuthorizedGrant {
                session: session.clone(),
                context: auth_context.clone(),
                issued_tokens: issued_tokens.clone(),
            };
            put_json(
                &*self.storage,
                &KeyFactory::authorization_grant(code),
                &grant,
                StorageOptions::relative(self.code_expires_in),
            )
            .await?;
        }

        info!(
            client_id = %client.client_id,
            subject = %session.subject,
            ?flow_type,
            "authorization granted"
        );

        let expires_in_secs = access_token.as_ref().map(|t| t.expires_in_secs());
        Ok(AuthorizationSuccess {
            redirect_uri,
            response_mode,
            code,
            id_token: id_token.map(|t| t.value),
            access_token: access_token.map(|t| t.value),
            token_type: wants_token.then_some("Bearer"),
            expires_in_secs,
            state: request.state.clone(),
        })
    }

    /// Consume the grant persisted behind an authorization code. Single-use:
    /// the token endpoint gets it exactly once.
    pub async fn take_grant(
        &self,
        code: &str,
    ) -> Result<Option<AuthorizedGrant>, crate::error::StorageError> {
        take_json(&*self.storage, &KeyFactory::authorization_grant(code)).await
    }
}
