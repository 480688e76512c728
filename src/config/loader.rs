//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Conventional backend variables (SUPABASE_URL, SUPABASE_ANON_KEY, ...)
//! 2. Environment variables (WASTEWISE_GATE__*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use regex::Regex;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "wastewise-gate.toml",
    ".wastewise-gate.toml",
    "~/.config/wastewise-gate/config.toml",
    "/etc/wastewise-gate/config.toml",
];

/// Backend URL variables, first set one wins
const BACKEND_URL_VARS: &[&str] = &["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];

/// Anon key variables, first set one wins
const ANON_KEY_VARS: &[&str] = &["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    // Skip anon key validation for testing
    validate_config_relaxed(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g., WASTEWISE_GATE__SERVER__PORT, WASTEWISE_GATE__SESSION__SECURE
    // Double underscore (__) maps to nested keys (server.port)
    builder = builder.add_source(
        Environment::with_prefix("WASTEWISE_GATE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    if let Some(url) = first_env(BACKEND_URL_VARS) {
        builder = builder
            .set_override("backend.url", url)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    if let Some(key) = first_env(ANON_KEY_VARS) {
        builder = builder
            .set_override("backend.anon_key", key)
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

fn first_env(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

/// Validate configuration values (relaxed - for testing without anon key)
fn validate_config_relaxed(config: &AppConfig) -> Result<(), ConfigError> {
    validate_url(&config.backend.url, "backend.url")?;
    validate_url(&config.upstream.url, "upstream.url")?;

    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "backend.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "upstream.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.backend.profiles_table.is_empty() {
        return Err(ConfigError::Missing {
            field: "backend.profiles_table".to_string(),
        });
    }

    validate_session(config)?;

    Ok(())
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_config_relaxed(config)?;

    match &config.backend.anon_key {
        Some(key) if !key.expose_secret().is_empty() => Ok(()),
        _ => Err(ConfigError::Missing {
            field: "backend.anon_key (set SUPABASE_ANON_KEY environment variable)".to_string(),
        }),
    }
}

fn validate_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::Missing {
            field: field.to_string(),
        });
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            message: format!("{} must start with http:// or https://, got: {}", field, url),
        });
    }

    Ok(())
}

fn validate_session(config: &AppConfig) -> Result<(), ConfigError> {
    // RFC 6265 cookie-name token
    let token = Regex::new(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$")
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    for (name, field) in [
        (&config.session.access_cookie, "session.access_cookie"),
        (&config.session.refresh_cookie, "session.refresh_cookie"),
    ] {
        if !token.is_match(name) {
            return Err(ConfigError::InvalidCookieName {
                name: name.clone(),
                field: field.to_string(),
            });
        }
    }

    if config.session.access_cookie == config.session.refresh_cookie {
        return Err(ConfigError::Invalid {
            message: "session.access_cookie and session.refresh_cookie must differ".to_string(),
        });
    }

    if config.session.max_age_secs <= 0 {
        return Err(ConfigError::Invalid {
            message: "session.max_age_secs must be greater than 0".to_string(),
        });
    }

    if config.session.expiry_leeway_secs < 0 {
        return Err(ConfigError::Invalid {
            message: "session.expiry_leeway_secs must not be negative".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::SecretString;

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[server]
name = "test-gate"

[backend]
url = "https://abc.supabase.co"
anon_key = "anon"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.backend.url, "https://abc.supabase.co");
        assert_eq!(
            config.backend.anon_key.as_ref().map(|k| k.expose_secret()),
            Some("anon")
        );
        assert_eq!(config.server.name, "test-gate");
    }

    #[test]
    fn test_invalid_url_error() {
        let toml = r#"
[backend]
url = "not-a-url"
"#;

        let result = load_config_from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_upstream_url_error() {
        let toml = r#"
[upstream]
url = ""
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result.unwrap_err(), ConfigError::Missing { .. }));
    }

    #[test]
    fn test_invalid_cookie_name() {
        let toml = r#"
[session]
access_cookie = "bad cookie;"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidCookieName { .. }
        ));
    }

    #[test]
    fn test_duplicate_cookie_names() {
        let toml = r#"
[session]
access_cookie = "sb-token"
refresh_cookie = "sb-token"
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result.unwrap_err(), ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_strict_validation_requires_anon_key() {
        let config = AppConfig::default();
        let result = validate_config(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::Missing { .. }));

        let config = AppConfig {
            backend: crate::config::BackendConfig {
                anon_key: Some(SecretString::new("anon")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let toml = r#"
[backend]
timeout_secs = 0
"#;

        assert!(load_config_from_str(toml).is_err());
    }
}
