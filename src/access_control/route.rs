//! Route classification
//!
//! Maps a request path to its protection class. Paths are canonicalized
//! first (percent-decoded, empty and dot segments removed), then prefix
//! tests are literal `starts_with` checks, so `/dashboards` is protected
//! just like `/dashboard/settings`, and `//admin` or `/%61dmin` count as
//! `/admin`.

use serde::Serialize;
use std::fmt;

/// Where unauthenticated callers are sent
pub const LOGIN_PATH: &str = "/auth/login";

/// Where authenticated non-admins are sent from admin routes
pub const DASHBOARD_PATH: &str = "/dashboard";

const AUTH_PREFIX: &str = "/auth";
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/profile"];
const ADMIN_PREFIX: &str = "/admin";

/// Protection class of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// No gate action
    Public,
    /// Login and signup pages
    Auth,
    /// Requires any authenticated session
    Protected,
    /// Requires a session whose profile role is admin
    Admin,
}

impl RouteClass {
    /// Classify a request path
    pub fn classify(path: &str) -> Self {
        if path.starts_with(AUTH_PREFIX) {
            RouteClass::Auth
        } else if PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            RouteClass::Protected
        } else if path.starts_with(ADMIN_PREFIX) {
            RouteClass::Admin
        } else {
            RouteClass::Public
        }
    }

    /// Whether the route cannot be served without a resolved session
    pub const fn requires_session(&self) -> bool {
        matches!(self, RouteClass::Protected | RouteClass::Admin)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Public => "public",
            RouteClass::Auth => "auth",
            RouteClass::Protected => "protected",
            RouteClass::Admin => "admin",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request path in two canonical spellings
///
/// `decoded` is fully percent-decoded and is what gets classified.
/// `encoded` only decodes unreserved characters, keeps every other escape
/// (uppercased) and is what gets forwarded, so the upstream app resolves
/// the same route the gate checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPath {
    decoded: String,
    encoded: String,
}

impl CanonicalPath {
    /// Returns `None` when the decoded path is not valid UTF-8
    pub fn parse(raw: &str) -> Option<Self> {
        let decoded = urlencoding::decode(raw).ok()?;
        Some(Self {
            decoded: remove_dot_segments(&decoded),
            encoded: remove_dot_segments(&decode_unreserved(raw)),
        })
    }

    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Collapse repeated slashes and resolve `.` and `..` segments
fn remove_dot_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(path.len());
    for segment in &segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() || path.ends_with('/') {
        out.push('/');
    }
    out
}

fn decode_unreserved(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());

        match escaped {
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') => {
                out.push(char::from(b));
                i += 3;
            }
            Some(b) => {
                out.push_str(&format!("%{b:02X}"));
                i += 3;
            }
            None => {
                out.push(char::from(bytes[i]));
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_class() {
        assert_eq!(RouteClass::classify("/auth/login"), RouteClass::Auth);
        assert_eq!(RouteClass::classify("/auth/signup"), RouteClass::Auth);
        assert_eq!(RouteClass::classify("/dashboard"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/dashboard/profile"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/profile"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/admin"), RouteClass::Admin);
        assert_eq!(RouteClass::classify("/admin/reports"), RouteClass::Admin);
        assert_eq!(RouteClass::classify("/community"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/"), RouteClass::Public);
    }

    #[test]
    fn test_prefix_is_literal() {
        assert_eq!(RouteClass::classify("/dashboards"), RouteClass::Protected);
        assert_eq!(RouteClass::classify("/administrator"), RouteClass::Admin);
        assert_eq!(RouteClass::classify("/authors"), RouteClass::Auth);
        // Case-sensitive, and only at the start of the path
        assert_eq!(RouteClass::classify("/Dashboard"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/community/admin"), RouteClass::Public);
    }

    fn canonical(raw: &str) -> (String, String) {
        let path = CanonicalPath::parse(raw).unwrap();
        (path.decoded().to_string(), path.encoded().to_string())
    }

    #[test]
    fn test_canonical_path_decodes_escaped_prefixes() {
        assert_eq!(canonical("/%64ashboard").0, "/dashboard");
        assert_eq!(canonical("/%61dmin/reports").0, "/admin/reports");
        assert_eq!(canonical("/%61dmin/reports").1, "/admin/reports");
        assert_eq!(canonical("/%70rofile").1, "/profile");
    }

    #[test]
    fn test_canonical_path_collapses_slashes_and_dots() {
        assert_eq!(canonical("//admin/reports").0, "/admin/reports");
        assert_eq!(canonical("/community/../admin").0, "/admin");
        assert_eq!(canonical("/./dashboard/.//settings/").0, "/dashboard/settings/");
        assert_eq!(canonical("/../..").0, "/");
        assert_eq!(canonical("/").0, "/");
    }

    #[test]
    fn test_canonical_path_keeps_reserved_escapes_for_forwarding() {
        let (decoded, encoded) = canonical("/community/a%2fb%20c");
        assert_eq!(decoded, "/community/a/b c");
        assert_eq!(encoded, "/community/a%2Fb%20c");

        // Stray percent signs are left alone
        assert_eq!(canonical("/100%").1, "/100%");
    }

    #[test]
    fn test_canonical_path_rejects_invalid_utf8() {
        assert!(CanonicalPath::parse("/%FF").is_none());
        assert!(CanonicalPath::parse("/admin%C0").is_none());
    }

    #[test]
    fn test_escaped_spellings_classify_like_plain_ones() {
        for raw in ["/%64ashboard", "//profile", "/community/../dashboard"] {
            let path = CanonicalPath::parse(raw).unwrap();
            assert_eq!(RouteClass::classify(path.decoded()), RouteClass::Protected);
        }
        for raw in ["//admin/reports", "/%61dmin", "/./admin"] {
            let path = CanonicalPath::parse(raw).unwrap();
            assert_eq!(RouteClass::classify(path.decoded()), RouteClass::Admin);
        }
    }

    #[test]
    fn test_requires_session() {
        assert!(RouteClass::Protected.requires_session());
        assert!(RouteClass::Admin.requires_session());
        assert!(!RouteClass::Auth.requires_session());
        assert!(!RouteClass::Public.requires_session());
    }
}
