//! Configuration types for wastewise-gate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::util::SecretString;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings
    pub server: ServerConfig,

    /// Auth/data backend connection settings
    pub backend: BackendConfig,

    /// Presentation app the gate forwards allowed requests to
    pub upstream: UpstreamConfig,

    /// Session cookie settings
    pub session: SessionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Server name, used in logs
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            name: "wastewise-gate".to_string(),
        }
    }
}

/// Backend-as-a-service connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL (e.g., `https://xyzcompany.supabase.co`)
    pub url: String,

    /// Public anon key (prefer env var SUPABASE_ANON_KEY)
    pub anon_key: Option<SecretString>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    /// Table holding one profile row per user
    pub profiles_table: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".to_string(),
            anon_key: None,
            timeout_secs: 10,
            verify_ssl: true,
            profiles_table: "profiles".to_string(),
        }
    }
}

impl BackendConfig {
    /// Base URL of the GoTrue auth API
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }

    /// Base URL of the PostgREST data API
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url.trim_end_matches('/'))
    }
}

/// Upstream (presentation app) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL requests are forwarded to
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3001".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the JWT access token
    pub access_cookie: String,

    /// Cookie carrying the refresh token
    pub refresh_cookie: String,

    /// Emit cookies with the `Secure` attribute
    pub secure: bool,

    /// `Max-Age` of rotated cookies
    pub max_age_secs: i64,

    /// Treat access tokens as expired this many seconds early
    pub expiry_leeway_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_cookie: "sb-access-token".to_string(),
            refresh_cookie: "sb-refresh-token".to_string(),
            secure: true,
            // 400 days, the browser cap on cookie lifetime
            max_age_secs: 400 * 24 * 60 * 60,
            expiry_leeway_secs: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

impl LogFormat {
    /// Parse a CLI value, falling back to `None` for unknown formats
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_urls() {
        let config = BackendConfig {
            url: "https://abc.supabase.co".to_string(),
            ..Default::default()
        };
        assert_eq!(config.auth_url(), "https://abc.supabase.co/auth/v1");
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1");

        // Test with trailing slash
        let config = BackendConfig {
            url: "https://abc.supabase.co/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.auth_url(), "https://abc.supabase.co/auth/v1");
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.backend.profiles_table, "profiles");
        assert_eq!(config.session.access_cookie, "sb-access-token");
        assert_eq!(config.session.refresh_cookie, "sb-refresh-token");
        assert!(config.session.secure);
        assert!(config.backend.anon_key.is_none());
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);

        assert_eq!(LogFormat::try_parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::try_parse("yaml"), None);
    }
}
