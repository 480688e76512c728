//! Identity provider trait
//!
//! The gate only needs "who is this caller" and "end this session" from the
//! identity provider. Keeping that behind a trait lets tests swap in fakes.

use crate::auth::session::{ResolvedSession, SessionCredentials};
use crate::error::AuthError;
// async_trait required for dyn-compatibility with Arc<dyn IdentityProvider>
use async_trait::async_trait;
use std::sync::Arc;

/// Identity provider trait
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller behind `credentials`.
    ///
    /// May rotate the credentials; any rotation is reported in
    /// [`ResolvedSession::update`] and must be written onto the response.
    /// Rejected credentials are not an error: they resolve to an anonymous
    /// session. `Err` is reserved for the provider being unreachable.
    async fn current_user(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<ResolvedSession, AuthError>;

    /// Revoke the session behind `credentials`
    async fn sign_out(&self, credentials: &SessionCredentials) -> Result<(), AuthError>;

    /// Name of the provider (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Shared handle to an identity provider
pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;
