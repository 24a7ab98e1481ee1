//! Session termination and logout fan-out.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::EndSessionError;
use crate::models::AuthSession;
use crate::providers::{AuthSessionService, ClientInfoProvider, IssuerProvider};

use super::notifier::{LogoutContext, LogoutNotifier};
use super::{EndSessionContext, EndSessionResponse};

/// Terminates the session and notifies every affected client.
pub struct EndSessionProcessor {
    clients: Arc<dyn ClientInfoProvider>,
    sessions: Arc<dyn AuthSessionService>,
    issuer: Arc<dyn IssuerProvider>,
    notifier: Arc<dyn LogoutNotifier>,
}

impl EndSessionProcessor {
    pub fn new(
        clients: Arc<dyn ClientInfoProvider>,
        sessions: Arc<dyn AuthSessionService>,
        issuer: Arc<dyn IssuerProvider>,
        notifier: Arc<dyn LogoutNotifier>,
    ) -> Self {
        Self {
            clients,
            sessions,
            issuer,
            notifier,
        }
    }

    pub async fn process(
        &self,
        context: EndSessionContext,
        session: Option<AuthSession>,
    ) -> Result<EndSessionResponse, EndSessionError> {
        let post_logout_redirect_uri = effective_post_logout_redirect_uri(&context);

        // Logging out without an active session is not an error; there is
        // simply nobody to notify.
        let session = match session {
            Some(session) => session,
            None => {
                return Ok(EndSessionResponse {
                    post_logout_redirect_uri,
                    front_channel_logout_uris: Vec::new(),
                })
            }
        };

        assert!(
            !session.subject.is_empty(),
            "end-session requires the active session to carry a subject"
        );

        self.sessions
            .sign_out(&session)
            .await
            .map_err(EndSessionError::SignOut)?;

        let logout_context = LogoutContext::new(
            session.session_id.clone(),
            session.subject.clone(),
            self.issuer.issuer().to_string(),
        );

        let mut clients = Vec::new();
        for client_id in &session.affected_client_ids {
            match self.clients.try_find(client_id).await {
                Ok(Some(client)) => clients.push(client),
                Ok(None) => debug!(%client_id, "skipping unknown client on logout"),
                Err(error) => warn!(%client_id, %error, "client lookup failed on logout"),
            }
        }

        // Fan out, wait for all; a failed notification is logged and the
        // logout still succeeds.
        let outcomes = join_all(clients.iter().map(|client| {
            let logout_context = &logout_context;
            async move {
                (
                    client.client_id.clone(),
                    self.notifier.notify_client(client, logout_context).await,
                )
            }
        }))
        .await;

        for (client_id, outcome) in outcomes {
            if let Err(error) = outcome {
                warn!(%client_id, %error, "logout notification failed");
            }
        }

        info!(
            subject = %session.subject,
            session_id = %session.session_id,
            clients = session.affected_client_ids.len(),
            "session terminated"
        );

        Ok(EndSessionResponse {
            post_logout_redirect_uri,
            front_channel_logout_uris: logout_context.front_channel_logout_uris(),
        })
    }
}

/// The redirect target for the user agent, with `state` appended when both
/// it and the URI are present.
fn effective_post_logout_redirect_uri(context: &EndSessionContext) -> Option<String> {
    let uri = context.request.post_logout_redirect_uri.as_deref()?;

    Some(match context.request.state.as_deref() {
        Some(state) => {
            let separator = if uri.contains('?') { '&' } else { '?' };
            format!("{uri}{separator}state={}", urlencoding::encode(state))
        }
        None => uri.to_string(),
    })
}
