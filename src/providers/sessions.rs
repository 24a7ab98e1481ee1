use async_trait::async_trait;

use crate::models::AuthSession;

/// Hook into the host application's session store, used by the end-session
/// pipeline to terminate the authenticated session.
#[async_trait]
pub trait AuthSessionService: Send + Sync {
    async fn sign_out(&self, session: &AuthSession) -> anyhow::Result<()>;
}

/// A session service for hosts that keep no server-side session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionService;

#[async_trait]
impl AuthSessionService for NoopSessionService {
    async fn sign_out(&self, _session: &AuthSession) -> anyhow::Result<()> {
        Ok(())
    }
}
