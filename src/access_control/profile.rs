//! Profile store
//!
//! Read-only access to the per-user profile row that carries the role.

use crate::access_control::role::Role;
use crate::auth::Session;
use crate::backend::BackendClient;
use crate::error::BackendResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Profile of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub role: Role,
}

/// Source of user profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up the profile of the session's user.
    ///
    /// `Ok(None)` means the user has no profile row.
    async fn fetch_profile(&self, session: &Session) -> BackendResult<Option<Profile>>;
}

/// Shared handle to a profile store
pub type SharedProfileStore = Arc<dyn ProfileStore>;

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    #[serde(default)]
    role: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let role = Role::from_stored(row.role.as_deref());
        if let Some(raw) = row.role.as_deref()
            && Role::try_parse(raw).is_none()
        {
            warn!(user_id = %row.id, role = raw, "Unrecognized profile role, treating as resident");
        }
        Profile { id: row.id, role }
    }
}

/// Profile store backed by the PostgREST `profiles` table
#[derive(Clone)]
pub struct RestProfileStore {
    client: BackendClient,
    table: String,
}

impl RestProfileStore {
    pub fn new(client: BackendClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn fetch_profile(&self, session: &Session) -> BackendResult<Option<Profile>> {
        let row: Option<ProfileRow> = self
            .client
            .select_single(
                &self.table,
                "id,role",
                "id",
                &session.user_id,
                &session.access_token,
            )
            .await?;

        Ok(row.map(Profile::from))
    }
}
