//! Shared fakes for integration tests
//!
//! In-memory identity provider and profile store with call counters, so
//! tests can drive every branch of the gate without a backend.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use wastewise_gate::access_control::{Profile, ProfileStore, Role};
use wastewise_gate::auth::{
    IdentityProvider, ResolvedSession, Session, SessionCredentials, SessionUpdate, TokenPair,
};
use wastewise_gate::error::{AuthError, BackendError, BackendResult};
use wastewise_gate::util::SecretString;

pub const ROTATED_ACCESS: &str = "rotated-access";
pub const ROTATED_REFRESH: &str = "rotated-refresh";

/// How the fake identity provider answers
#[derive(Debug, Clone)]
pub enum Identity {
    /// No session
    Anonymous,
    /// Session for this user id
    User(&'static str),
    /// Session for this user id, with freshly rotated tokens
    Rotated(&'static str),
    /// No session, stored tokens must be dropped
    Expired,
    /// Provider unreachable
    Down,
    /// Tokens were rotated, then the provider became unreachable
    RotatedThenDown,
}

pub struct FakeIdentity {
    behavior: Identity,
    calls: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl FakeIdentity {
    pub fn new(behavior: Identity) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

pub fn session_for(user_id: &str, access_token: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        access_token: SecretString::new(access_token),
    }
}

pub fn rotated_pair() -> TokenPair {
    TokenPair {
        access_token: SecretString::new(ROTATED_ACCESS),
        refresh_token: SecretString::new(ROTATED_REFRESH),
    }
}

fn service_unavailable() -> BackendError {
    BackendError::Api {
        status: 503,
        message: "upstream connect error".to_string(),
    }
}

fn unavailable() -> AuthError {
    AuthError::Unavailable(service_unavailable())
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_user(
        &self,
        _credentials: &SessionCredentials,
    ) -> Result<ResolvedSession, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Identity::Anonymous => Ok(ResolvedSession::anonymous()),
            Identity::User(id) => Ok(ResolvedSession::authenticated(session_for(id, "access"))),
            Identity::Rotated(id) => Ok(ResolvedSession::authenticated(session_for(
                id,
                ROTATED_ACCESS,
            ))
            .with_update(SessionUpdate::Rotated(rotated_pair()))),
            Identity::Expired => {
                Ok(ResolvedSession::anonymous().with_update(SessionUpdate::Cleared))
            }
            Identity::Down => Err(unavailable()),
            Identity::RotatedThenDown => Err(AuthError::UnavailableAfterRefresh {
                pair: rotated_pair(),
                source: service_unavailable(),
            }),
        }
    }

    async fn sign_out(&self, _credentials: &SessionCredentials) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Identity::Down => Err(unavailable()),
            _ => Ok(()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// How the fake profile store answers
#[derive(Debug, Clone, Copy)]
pub enum Profiles {
    Role(Role),
    Missing,
    Fails,
}

pub struct FakeProfiles {
    behavior: Profiles,
    calls: AtomicUsize,
}

impl FakeProfiles {
    pub fn new(behavior: Profiles) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn fetch_profile(&self, session: &Session) -> BackendResult<Option<Profile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            Profiles::Role(role) => Ok(Some(Profile {
                id: session.user_id.clone(),
                role,
            })),
            Profiles::Missing => Ok(None),
            Profiles::Fails => Err(BackendError::InvalidResponse(
                "malformed profile row".to_string(),
            )),
        }
    }
}
