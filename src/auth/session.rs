//! Session credential model
//!
//! Credentials arrive with each request as an optional access/refresh token
//! pair and are resolved fresh every time. Nothing here is cached between
//! requests.

use crate::backend::AuthUser;
use crate::util::SecretString;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw credential material taken from the request, passed to the identity
/// provider unmodified.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
}

impl SessionCredentials {
    /// Empty values count as absent.
    pub fn new(access_token: Option<SecretString>, refresh_token: Option<SecretString>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.is_empty()),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
        }
    }

    /// No credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A freshly issued token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// Change to the caller's credentials that must reach the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The provider rotated the tokens; the client must store the new pair
    Rotated(TokenPair),
    /// The stored tokens are dead; the client must drop them
    Cleared,
}

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    /// Access token valid for this request (the rotated one if a refresh happened)
    pub access_token: SecretString,
}

impl Session {
    pub fn new(user: AuthUser, access_token: SecretString) -> Self {
        Self {
            user_id: user.id,
            access_token,
        }
    }
}

/// Result of resolving a request's credentials
#[derive(Debug, Clone, Default)]
pub struct ResolvedSession {
    /// `None` means unauthenticated
    pub session: Option<Session>,
    /// Credential change to propagate, if any
    pub update: Option<SessionUpdate>,
}

impl ResolvedSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session: Session) -> Self {
        Self {
            session: Some(session),
            update: None,
        }
    }

    pub fn with_update(mut self, update: SessionUpdate) -> Self {
        self.update = Some(update);
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Current unix time in seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Read the `exp` claim of a JWT without verifying it.
///
/// Verification is the identity provider's job; this only decides whether a
/// refresh is due before asking it. Returns `None` when the token is not a
/// JWT or carries no `exp`.
pub fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    claim.exp
}

/// Whether `token` expires within `leeway` seconds of `now`.
///
/// Undecodable tokens report `false` and are left for the provider to judge.
pub fn is_expired(token: &str, now: i64, leeway: i64) -> bool {
    token_expiry(token).is_some_and(|exp| exp <= now + leeway)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_empty_tokens_are_absent() {
        let creds = SessionCredentials::new(Some(SecretString::new("")), None);
        assert!(creds.is_empty());
        assert!(creds.access_token().is_none());
    }

    #[test]
    fn test_token_expiry_reads_exp() {
        let token = jwt_with(r#"{"sub":"u1","exp":1700000000}"#);
        assert_eq!(token_expiry(&token), Some(1_700_000_000));
    }

    #[test]
    fn test_token_expiry_missing_or_garbage() {
        assert_eq!(token_expiry(&jwt_with(r#"{"sub":"u1"}"#)), None);
        assert_eq!(token_expiry("opaque-token"), None);
        assert_eq!(token_expiry("a.!!!.c"), None);
    }

    #[test]
    fn test_is_expired_with_leeway() {
        let token = jwt_with(r#"{"exp":1000}"#);
        assert!(is_expired(&token, 1000, 0));
        assert!(is_expired(&token, 995, 10));
        assert!(!is_expired(&token, 980, 10));
        assert!(!is_expired("opaque-token", i64::MAX / 2, 0));
    }

    #[test]
    fn test_resolved_session_builders() {
        let resolved = ResolvedSession::anonymous().with_update(SessionUpdate::Cleared);
        assert!(resolved.session.is_none());
        assert_eq!(resolved.update, Some(SessionUpdate::Cleared));

        let user = AuthUser {
            id: "u1".to_string(),
        };
        let resolved = ResolvedSession::authenticated(Session::new(user, SecretString::new("at")));
        assert_eq!(resolved.user_id(), Some("u1"));
        assert!(resolved.update.is_none());
    }
}
