//! Supabase (GoTrue) identity provider
//!
//! Resolves sessions from an access/refresh token pair, refreshing the pair
//! when the access token has expired or was rejected.

use crate::auth::provider::IdentityProvider;
use crate::auth::session::{
    ResolvedSession, Session, SessionCredentials, SessionUpdate, TokenPair, is_expired, unix_now,
};
use crate::backend::BackendClient;
use crate::error::AuthError;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// GoTrue-backed identity provider
#[derive(Clone)]
pub struct SupabaseIdentity {
    client: BackendClient,
    expiry_leeway_secs: i64,
}

impl SupabaseIdentity {
    pub fn new(client: BackendClient, expiry_leeway_secs: i64) -> Self {
        Self {
            client,
            expiry_leeway_secs,
        }
    }

    /// Run the refresh-token grant
    async fn refresh(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<ResolvedSession, AuthError> {
        let Some(refresh_token) = credentials.refresh_token() else {
            debug!("No refresh token, dropping stale credentials");
            return Ok(ResolvedSession::anonymous().with_update(SessionUpdate::Cleared));
        };

        let tokens = match self.client.refresh_session(refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) if e.is_unavailable() => return Err(AuthError::Unavailable(e)),
            Err(e) => {
                debug!(error = %e, "Refresh token rejected");
                return Ok(ResolvedSession::anonymous().with_update(SessionUpdate::Cleared));
            }
        };

        // The old refresh token is revoked from here on, so every path below
        // hands the new pair to the client
        let pair = TokenPair {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token,
        };

        let user = match tokens.user {
            Some(user) => user,
            None => match self.client.get_user(&tokens.access_token).await {
                Ok(user) => user,
                Err(e) if e.is_unavailable() => {
                    return Err(AuthError::UnavailableAfterRefresh { pair, source: e });
                }
                Err(e) => {
                    debug!(error = %e, "Refreshed access token rejected");
                    return Ok(ResolvedSession::anonymous()
                        .with_update(SessionUpdate::Rotated(pair)));
                }
            },
        };

        debug!(user_id = %user.id, "Session refreshed");

        Ok(
            ResolvedSession::authenticated(Session::new(user, tokens.access_token))
                .with_update(SessionUpdate::Rotated(pair)),
        )
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    #[instrument(skip_all)]
    async fn current_user(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<ResolvedSession, AuthError> {
        if credentials.is_empty() {
            return Ok(ResolvedSession::anonymous());
        }

        if let Some(access_token) = credentials.access_token()
            && !is_expired(
                access_token.expose_secret(),
                unix_now(),
                self.expiry_leeway_secs,
            )
        {
            match self.client.get_user(access_token).await {
                Ok(user) => {
                    return Ok(ResolvedSession::authenticated(Session::new(
                        user,
                        access_token.clone(),
                    )));
                }
                Err(e) if e.is_unavailable() => return Err(AuthError::Unavailable(e)),
                Err(e) => debug!(error = %e, "Access token rejected, trying refresh"),
            }
        }

        self.refresh(credentials).await
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), AuthError> {
        match credentials.access_token() {
            Some(access_token) => self
                .client
                .logout(access_token)
                .await
                .map_err(AuthError::SignOut),
            None => Ok(()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "Supabase GoTrue"
    }
}
