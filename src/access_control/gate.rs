//! Access gate
//!
//! One-shot, per-request decision: classify the path, resolve the session,
//! and pass the request through or redirect it. Rules, first match wins:
//!
//! 1. protected route, no session → `/auth/login`
//! 2. admin route, session → profile lookup; not admin or lookup failed → `/dashboard`
//! 3. admin route, no session → `/auth/login`
//! 4. otherwise pass through
//!
//! Any credential rotation reported by the identity provider is carried on
//! the decision whatever the outcome.

use crate::access_control::profile::ProfileStore;
use crate::access_control::route::{DASHBOARD_PATH, LOGIN_PATH, RouteClass};
use crate::auth::{IdentityProvider, Session, SessionCredentials, SessionUpdate};
use tracing::{debug, info, instrument, warn};

/// What to do with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Let the request proceed
    PassThrough,
    /// Send the caller to this path
    Redirect(&'static str),
    /// The identity provider could not be reached for a route that needs it
    Unavailable,
}

impl GateOutcome {
    pub fn is_pass_through(&self) -> bool {
        matches!(self, GateOutcome::PassThrough)
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match *self {
            GateOutcome::Redirect(target) => Some(target),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            GateOutcome::PassThrough => "pass_through",
            GateOutcome::Redirect(_) => "redirect",
            GateOutcome::Unavailable => "unavailable",
        }
    }
}

/// Full result of evaluating one request
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub route: RouteClass,
    pub outcome: GateOutcome,
    /// Resolved caller, if any
    pub user_id: Option<String>,
    /// Credential change that must be written onto the response
    pub credentials: Option<SessionUpdate>,
}

impl GateDecision {
    /// `Location` for a redirect outcome.
    ///
    /// Only the path is replaced; the original query string is kept.
    pub fn redirect_location(&self, query: Option<&str>) -> Option<String> {
        let target = self.outcome.redirect_target()?;
        Some(match query {
            Some(q) if !q.is_empty() => format!("{}?{}", target, q),
            _ => target.to_string(),
        })
    }
}

/// Request-scoped access gate
///
/// Borrows its collaborators, so each request builds its own gate around
/// whatever provider and store the caller injects.
pub struct AccessGate<'a> {
    identity: &'a dyn IdentityProvider,
    profiles: &'a dyn ProfileStore,
}

impl<'a> AccessGate<'a> {
    pub fn new(identity: &'a dyn IdentityProvider, profiles: &'a dyn ProfileStore) -> Self {
        Self { identity, profiles }
    }

    /// Decide what happens to a request for `path`
    #[instrument(skip(self, credentials), fields(route = tracing::field::Empty))]
    pub async fn evaluate(&self, path: &str, credentials: &SessionCredentials) -> GateDecision {
        let route = RouteClass::classify(path);
        tracing::Span::current().record("route", route.as_str());

        // Always resolved, even for public paths, so rotated credentials
        // reach the client on every response.
        let resolved = match self.identity.current_user(credentials).await {
            Ok(resolved) => resolved,
            Err(e) => {
                let outcome = if route.requires_session() {
                    GateOutcome::Unavailable
                } else {
                    GateOutcome::PassThrough
                };
                warn!(
                    error = %e,
                    provider = self.identity.provider_name(),
                    outcome = outcome.as_str(),
                    "Identity provider unavailable"
                );
                return GateDecision {
                    route,
                    outcome,
                    user_id: None,
                    credentials: e.rotated_pair().cloned().map(SessionUpdate::Rotated),
                };
            }
        };

        let outcome = match (route, &resolved.session) {
            (RouteClass::Protected, None) => GateOutcome::Redirect(LOGIN_PATH),
            (RouteClass::Admin, Some(session)) => self.authorize_admin(session).await,
            (RouteClass::Admin, None) => GateOutcome::Redirect(LOGIN_PATH),
            _ => GateOutcome::PassThrough,
        };

        debug!(
            user_id = resolved.user_id(),
            outcome = outcome.as_str(),
            rotated = resolved.update.is_some(),
            "Gate decision"
        );

        GateDecision {
            route,
            outcome,
            user_id: resolved.session.map(|s| s.user_id),
            credentials: resolved.update,
        }
    }

    /// Fails closed: anything short of a readable admin profile redirects
    async fn authorize_admin(&self, session: &Session) -> GateOutcome {
        match self.profiles.fetch_profile(session).await {
            Ok(Some(profile)) if profile.role.is_admin() => GateOutcome::PassThrough,
            Ok(Some(profile)) => {
                info!(user_id = %session.user_id, role = %profile.role, "Admin route denied: role is not admin");
                GateOutcome::Redirect(DASHBOARD_PATH)
            }
            Ok(None) => {
                debug!(user_id = %session.user_id, "Admin route denied: no profile");
                GateOutcome::Redirect(DASHBOARD_PATH)
            }
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "Admin route denied: profile lookup failed");
                GateOutcome::Redirect(DASHBOARD_PATH)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(outcome: GateOutcome) -> GateDecision {
        GateDecision {
            route: RouteClass::Protected,
            outcome,
            user_id: None,
            credentials: None,
        }
    }

    #[test]
    fn test_redirect_location_keeps_query() {
        let d = decision(GateOutcome::Redirect(LOGIN_PATH));
        assert_eq!(
            d.redirect_location(Some("tab=history")).as_deref(),
            Some("/auth/login?tab=history")
        );
        assert_eq!(d.redirect_location(None).as_deref(), Some("/auth/login"));
        assert_eq!(d.redirect_location(Some("")).as_deref(), Some("/auth/login"));
    }

    #[test]
    fn test_no_location_without_redirect() {
        assert!(decision(GateOutcome::PassThrough).redirect_location(None).is_none());
        assert!(decision(GateOutcome::Unavailable).redirect_location(None).is_none());
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(GateOutcome::PassThrough.is_pass_through());
        assert_eq!(GateOutcome::Redirect(DASHBOARD_PATH).redirect_target(), Some("/dashboard"));
        assert_eq!(GateOutcome::Unavailable.redirect_target(), None);
    }
}
