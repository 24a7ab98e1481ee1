use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ErrorCode, RequestError};
use crate::providers::ClientInfoProvider;

use super::{ContextValidator, ValidationContext};

/// Resolves the requesting client and records it in the context. Everything
/// after this validator may rely on `context.client_info()`.
pub struct ClientValidator {
    clients: Arc<dyn ClientInfoProvider>,
}

impl ClientValidator {
    pub fn new(clients: Arc<dyn ClientInfoProvider>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl ContextValidator for ClientValidator {
    async fn validate(&self, context: &mut ValidationContext) -> Option<RequestError> {
        let client_id = match context.request.client_id.as_deref() {
            Some(client_id) if !client_id.is_empty() => client_id,
            _ => {
                return Some(RequestError::new(
                    ErrorCode::UnauthorizedClient,
                    "client_id is required",
                ))
            }
        };

        // client_id comparison is case-sensitive; the provider does the
        // exact-match lookup.
        match self.clients.try_find(client_id).await {
            Ok(Some(client)) => {
                context.set_client_info(client);
                None
            }
            Ok(None) => Some(RequestError::new(
                ErrorCode::UnauthorizedClient,
                format!("unknown client: {client_id}"),
            )),
            Err(error) => {
                warn!(%client_id, %error, "client lookup failed");
                Some(RequestError::new(
                    ErrorCode::UnauthorizedClient,
                    "client could not be resolved",
                ))
            }
        }
    }
}
