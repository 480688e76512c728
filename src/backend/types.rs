//! Backend API response types
//!
//! Only the fields the gate reads are modelled; everything else in the
//! payloads is ignored.

use crate::util::SecretString;
use serde::Deserialize;

/// User record returned by `GET /auth/v1/user`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    /// User id (UUID), also the primary key of the profile row
    pub id: String,
}

/// Session returned by the refresh-token grant
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: SecretString,

    pub refresh_token: SecretString,

    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_auth_user_ignores_extra_fields() {
        let json = r#"{
            "id": "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "asha@example.in",
            "app_metadata": {"provider": "email"}
        }"#;

        let user: AuthUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "8d0fd2b3-9ca7-4d9e-a95f-9e13dded323e");
    }

    #[test]
    fn test_deserialize_token_response() {
        let json = r#"{
            "access_token": "new-access",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1760000000,
            "refresh_token": "new-refresh",
            "user": {"id": "u1"}
        }"#;

        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token.expose_secret(), "new-access");
        assert_eq!(tokens.refresh_token.expose_secret(), "new-refresh");
        assert_eq!(tokens.user.map(|u| u.id), Some("u1".to_string()));
    }

    #[test]
    fn test_deserialize_token_response_without_user() {
        let json = r#"{"access_token": "a", "refresh_token": "r"}"#;

        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(tokens.user.is_none());
    }
}
