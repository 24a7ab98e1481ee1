//! Logout notification to relying parties.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::models::{AuthSession, ClientInfo};
use crate::services::LogoutTokenService;

/// Deadline for each back-channel logout POST.
const BACK_CHANNEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a notifier needs to know about the terminated session, plus
/// the front-channel URI list the notifiers fill in concurrently.
#[derive(Debug)]
pub struct LogoutContext {
    pub session_id: String,
    pub subject: String,
    pub issuer: String,
    front_channel_logout_uris: Mutex<Vec<String>>,
}

impl LogoutContext {
    pub fn new(
        session_id: impl Into<String>,
        subject: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            subject: subject.into(),
            issuer: issuer.into(),
            front_channel_logout_uris: Mutex::new(Vec::new()),
        }
    }

    pub fn push_front_channel_logout_uri(&self, uri: String) {
        self.front_channel_logout_uris.lock().unwrap().push(uri);
    }

    pub fn front_channel_logout_uris(&self) -> Vec<String> {
        self.front_channel_logout_uris.lock().unwrap().clone()
    }
}

/// Delivers a logout notification to one client. Implementations must be
/// safe to invoke concurrently for different clients of the same context.
#[async_trait]
pub trait LogoutNotifier: Send + Sync {
    async fn notify_client(&self, client: &ClientInfo, context: &LogoutContext)
        -> anyhow::Result<()>;
}

/// The standard notifier: collects front-channel logout URIs into the
/// context and POSTs logout tokens to back-channel endpoints. A client may
/// be registered for both.
pub struct DefaultLogoutNotifier {
    http: reqwest::Client,
    logout_tokens: Arc<LogoutTokenService>,
}

impl DefaultLogoutNotifier {
    pub fn new(logout_tokens: Arc<LogoutTokenService>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(BACK_CHANNEL_TIMEOUT)
            .build()
            .expect("failed to build the back-channel HTTP client");

        Self {
            http,
            logout_tokens,
        }
    }
}

#[async_trait]
impl LogoutNotifier for DefaultLogoutNotifier {
    async fn notify_client(
        &self,
        client: &ClientInfo,
        context: &LogoutContext,
    ) -> anyhow::Result<()> {
        if let Some(front_channel_uri) = &client.front_channel_logout_uri {
            let separator = if front_channel_uri.contains('?') { '&' } else { '?' };
            let uri = format!(
                "{front_channel_uri}{separator}iss={}&sid={}",
                urlencoding::encode(&context.issuer),
                urlencoding::encode(&context.session_id),
            );
            context.push_front_channel_logout_uri(uri);
            debug!(client_id = %client.client_id, "front-channel logout URI collected");
        }

        if client.back_channel_logout.is_some() {
            let session = AuthSession::new(context.subject.clone(), context.session_id.clone());
            let token = self.logout_tokens.create(client, &session).await?;
            let endpoint = &client.back_channel_logout.as_ref().unwrap().uri;

            self.http
                .post(endpoint)
                .form(&[("logout_token", token.value.as_str())])
                .send()
                .await?
                .error_for_status()?;
            debug!(client_id = %client.client_id, "back-channel logout delivered");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{JwtFormatter, ServiceKey, StaticKeyResolver};
    use crate::providers::{ManualClock, StaticIssuer, UuidIdGenerator};
    use chrono::Utc;
    use jsonwebtoken::Algorithm;

    const PRIVATE_PEM: &str = include_str!("../../keys/private.pem");
    const PUBLIC_PEM: &str = include_str!("../../keys/public.pem");

    fn notifier() -> DefaultLogoutNotifier {
        let keys: Arc<StaticKeyResolver> = Arc::new(StaticKeyResolver::single(
            ServiceKey::from_rsa_pem(None, Algorithm::RS256, PRIVATE_PEM, PUBLIC_PEM).unwrap(),
        ));
        DefaultLogoutNotifier::new(Arc::new(LogoutTokenService::new(
            Arc::new(ManualClock::new(Utc::now())),
            Arc::new(UuidIdGenerator),
            Arc::new(StaticIssuer::new("https://op.example.com")),
            Arc::new(JwtFormatter::new(keys)),
        )))
    }

    #[tokio::test]
    async fn test_front_channel_uri_carries_issuer_and_session() {
        let context = LogoutContext::new("session_1", "user_1", "https://op.example.com");
        let mut client = ClientInfo::new("client_1");
        client.front_channel_logout_uri = Some("https://client.example/front-logout".to_string());

        notifier().notify_client(&client, &context).await.unwrap();

        let uris = context.front_channel_logout_uris();
        assert_eq!(uris.len(), 1);
        assert_eq!(
            uris[0],
            "https://client.example/front-logout?iss=https%3A%2F%2Fop.example.com&sid=session_1"
        );
    }

    #[tokio::test]
    async fn test_front_channel_uri_appends_to_existing_query() {
        let context = LogoutContext::new("session_1", "user_1", "https://op.example.com");
        let mut client = ClientInfo::new("client_1");
        client.front_channel_logout_uri =
            Some("https://client.example/front-logout?tenant=a".to_string());

        notifier().notify_client(&client, &context).await.unwrap();

        assert!(context.front_channel_logout_uris()[0]
            .starts_with("https://client.example/front-logout?tenant=a&iss="));
    }

    #[tokio::test]
    async fn test_client_without_logout_registration_is_a_no_op() {
        let context = LogoutContext::new("session_1", "user_1", "https://op.example.com");
        let client = ClientInfo::new("client_1");

        notifier().notify_client(&client, &context).await.unwrap();
        assert!(context.front_channel_logout_uris().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_back_channel_endpoint_errors() {
        let context = LogoutContext::new("session_1", "user_1", "https://op.example.com");
        let mut client = ClientInfo::new("client_1");
        client.back_channel_logout = Some(crate::models::BackChannelLogout::new(
            "http://127.0.0.1:9/logout",
        ));

        let result = notifier().notify_client(&client, &context).await;
        assert!(result.is_err());
    }
}
