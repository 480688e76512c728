//! Session cookies
//!
//! Reads credentials from the request's cookie jar and writes credential
//! updates back to it. `CookieManagerLayer` turns jar changes into
//! `Set-Cookie` headers on whatever response leaves the service.

use crate::auth::{SessionCredentials, SessionUpdate, TokenPair};
use crate::config::SessionConfig;
use crate::util::SecretString;
use axum::http::HeaderValue;
use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

/// Names and attributes of the two session cookies
#[derive(Debug, Clone)]
pub struct SessionCookies {
    access: String,
    refresh: String,
    secure: bool,
    max_age_secs: i64,
}

impl SessionCookies {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            access: config.access_cookie.clone(),
            refresh: config.refresh_cookie.clone(),
            secure: config.secure,
            max_age_secs: config.max_age_secs,
        }
    }

    /// Credentials presented with the request
    pub fn credentials(&self, jar: &Cookies) -> SessionCredentials {
        let read = |name: &str| jar.get(name).map(|c| SecretString::new(c.value()));
        SessionCredentials::new(read(&self.access), read(&self.refresh))
    }

    /// Record a credential update in the jar
    pub fn apply(&self, jar: &Cookies, update: &SessionUpdate) {
        match update {
            SessionUpdate::Rotated(pair) => self.store(jar, pair),
            SessionUpdate::Cleared => self.clear(jar),
        }
    }

    fn store(&self, jar: &Cookies, pair: &TokenPair) {
        jar.add(self.build(&self.access, pair.access_token.expose_secret()));
        jar.add(self.build(&self.refresh, pair.refresh_token.expose_secret()));
    }

    /// Remove both session cookies
    pub fn clear(&self, jar: &Cookies) {
        for name in [&self.access, &self.refresh] {
            // Removal only emits a cookie when the path matches the stored one
            jar.remove(Cookie::build((name.clone(), "")).path("/").build());
        }
    }

    fn build(&self, name: &str, value: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(self.max_age_secs))
            .build()
    }
}

/// `Cookie` header reflecting the jar after any updates.
///
/// Forwarded requests carry this instead of the original header, so the
/// upstream app sees the same credentials the client will hold.
pub fn cookie_header(jar: &Cookies) -> Option<HeaderValue> {
    let pairs: Vec<String> = jar
        .list()
        .iter()
        .map(|c| format!("{}={}", c.name(), c.value()))
        .collect();

    if pairs.is_empty() {
        return None;
    }

    HeaderValue::from_str(&pairs.join("; ")).ok()
}
