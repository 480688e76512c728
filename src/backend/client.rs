//! Backend API client
//!
//! Typed HTTP client for the two REST surfaces of the backend-as-a-service:
//! the GoTrue auth API (`/auth/v1`) and the PostgREST data API (`/rest/v1`).

use crate::backend::types::{AuthUser, TokenResponse};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};
use crate::util::SecretString;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Accept header asking PostgREST for exactly one object instead of an array
const PGRST_SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Backend API client
///
/// Holds only the connection pool and the project's anon key. Per-user
/// credentials are passed in on every call, so one client can serve every
/// request without sharing any session state between them.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    auth_url: String,
    rest_url: String,
    anon_key: SecretString,
}

impl BackendClient {
    /// Create a new backend client from configuration
    pub fn new(config: &BackendConfig, anon_key: SecretString) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("wastewise-gate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BackendError::Request)?;

        Ok(Self {
            http,
            auth_url: config.auth_url(),
            rest_url: config.rest_url(),
            anon_key,
        })
    }

    /// Attach the project key and, when given, the caller's bearer token
    fn authenticate(&self, request: RequestBuilder, bearer: Option<&SecretString>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        request
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token.expose_secret())
    }

    /// Send once and map non-success statuses; no retries
    async fn execute(&self, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Backend returned error status");
        Err(BackendError::from_response(status.as_u16(), &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Resolve the user an access token belongs to
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &SecretString) -> BackendResult<AuthUser> {
        let request = self.http.get(format!("{}/user", self.auth_url));
        let request = self.authenticate(request, Some(access_token));

        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// Refresh tokens are single-use: on success the old one is revoked, so
    /// the returned pair must reach the client or the session is lost.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &SecretString) -> BackendResult<TokenResponse> {
        let request = self
            .http
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token.expose_secret() }));
        let request = self.authenticate(request, None);

        let response = self.execute(request).await?;
        Self::parse(response).await
    }

    /// Revoke the session behind an access token
    #[instrument(skip_all)]
    pub async fn logout(&self, access_token: &SecretString) -> BackendResult<()> {
        let request = self.http.post(format!("{}/logout", self.auth_url));
        let request = self.authenticate(request, Some(access_token));

        self.execute(request).await?;
        Ok(())
    }

    /// Fetch a single row by equality on one column.
    ///
    /// Runs with the caller's access token so row-level security applies.
    /// Returns `Ok(None)` when no row matched.
    #[instrument(skip(self, access_token), fields(table = %table))]
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        column: &str,
        value: &str,
        access_token: &SecretString,
    ) -> BackendResult<Option<T>> {
        let url = format!(
            "{}/{}?select={}&{}=eq.{}",
            self.rest_url,
            urlencoding::encode(table),
            urlencoding::encode(columns),
            urlencoding::encode(column),
            urlencoding::encode(value),
        );
        let request = self
            .http
            .get(url)
            .header(header::ACCEPT, PGRST_SINGLE_OBJECT);
        let request = self.authenticate(request, Some(access_token));

        match self.execute(request).await {
            Ok(response) => Self::parse(response).await.map(Some),
            Err(BackendError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
