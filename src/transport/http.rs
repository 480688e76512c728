//! HTTP transport
//!
//! Builds the axum router that runs the access gate in front of every
//! request and serves it until shutdown.

use crate::access_control::{
    AccessGate, CanonicalPath, GateOutcome, RestProfileStore, SharedProfileStore,
};
use crate::auth::{SharedIdentityProvider, SupabaseIdentity};
use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::error::{AppError, ConfigError, TransportError};
use crate::transport::cookies::{SessionCookies, cookie_header};
use crate::transport::proxy::UpstreamProxy;
use crate::util::{bind_strict, socket_addr};
use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Default port for the gate
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:3000")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        Ok(Self::new(socket_addr(host, port)?))
    }
}

/// Shared state for the gate and its handlers
///
/// Holds only connection pools and configuration; nothing here carries
/// per-user state between requests.
#[derive(Clone)]
pub struct GateState {
    pub identity: SharedIdentityProvider,
    pub profiles: SharedProfileStore,
    pub cookies: Arc<SessionCookies>,
    pub upstream: Arc<UpstreamProxy>,
}

impl GateState {
    pub fn new(
        identity: SharedIdentityProvider,
        profiles: SharedProfileStore,
        cookies: SessionCookies,
        upstream: UpstreamProxy,
    ) -> Self {
        Self {
            identity,
            profiles,
            cookies: Arc::new(cookies),
            upstream: Arc::new(upstream),
        }
    }

    /// Wire the Supabase-backed provider and store from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let anon_key = config
            .backend
            .anon_key
            .clone()
            .ok_or_else(|| ConfigError::Missing {
                field: "backend.anon_key".to_string(),
            })?;

        let client = BackendClient::new(&config.backend, anon_key)?;
        let identity = SupabaseIdentity::new(client.clone(), config.session.expiry_leeway_secs);
        let profiles = RestProfileStore::new(client, &config.backend.profiles_table);

        Ok(Self::new(
            Arc::new(identity),
            Arc::new(profiles),
            SessionCookies::new(&config.session),
            UpstreamProxy::new(&config.upstream)?,
        ))
    }
}

/// Build the gate router
///
/// Layer order, outermost first: tracing, cookie manager, access gate.
/// The cookie manager sits outside the gate so credential updates land on
/// every response, redirects included.
///
/// `/auth/signout` only accepts `POST`; other methods get 405 from the
/// router and are not forwarded upstream.
pub fn build_router(state: GateState) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn_with_state(state.clone(), access_gate));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/signout", post(sign_out))
        .fallback(forward)
        .layer(layers)
        .with_state(state)
}

/// Access gate middleware
///
/// Classifies the canonical path and forwards the request under that same
/// path. Paths that do not decode to UTF-8 are refused with 400.
pub async fn access_gate(
    State(state): State<GateState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(path) = CanonicalPath::parse(request.uri().path()) else {
        return bad_request();
    };
    if path.encoded() != request.uri().path() {
        match with_path(request.uri(), path.encoded()) {
            Ok(uri) => *request.uri_mut() = uri,
            Err(_) => return bad_request(),
        }
    }

    let credentials = state.cookies.credentials(&cookies);
    let gate = AccessGate::new(state.identity.as_ref(), state.profiles.as_ref());
    let decision = gate.evaluate(path.decoded(), &credentials).await;

    if let Some(update) = &decision.credentials {
        state.cookies.apply(&cookies, update);

        match cookie_header(&cookies) {
            Some(value) => {
                request.headers_mut().insert(header::COOKIE, value);
            }
            None => {
                request.headers_mut().remove(header::COOKIE);
            }
        }
    }

    info!(
        path = path.decoded(),
        route = %decision.route,
        user_id = decision.user_id.as_deref(),
        outcome = decision.outcome.as_str(),
        "Gate"
    );

    match decision.outcome {
        GateOutcome::PassThrough => next.run(request).await,
        GateOutcome::Redirect(_) => {
            let location = decision
                .redirect_location(request.uri().query())
                .unwrap_or_default();
            Redirect::temporary(&location).into_response()
        }
        GateOutcome::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Authentication service unavailable",
        )
            .into_response(),
    }
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "Malformed request path").into_response()
}

/// Replace the path of `uri`, keeping its query
fn with_path(uri: &Uri, path: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_owned(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse()?);
    Ok(Uri::from_parts(parts)?)
}

async fn healthz() -> &'static str {
    "ok"
}

/// End the session and send the caller home
async fn sign_out(State(state): State<GateState>, cookies: Cookies) -> Response {
    let credentials = state.cookies.credentials(&cookies);

    // Best-effort: the local cookies go regardless
    if let Err(e) = state.identity.sign_out(&credentials).await {
        warn!(error = %e, "Sign-out at identity provider failed");
    }

    state.cookies.clear(&cookies);
    Redirect::to("/").into_response()
}

async fn forward(State(state): State<GateState>, request: Request) -> Response {
    match state.upstream.forward(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Upstream request failed");
            (StatusCode::BAD_GATEWAY, "Upstream unavailable").into_response()
        }
    }
}

/// Serve the router until `ct` is cancelled
pub async fn run_http(
    router: Router,
    config: HttpConfig,
    ct: CancellationToken,
) -> Result<(), TransportError> {
    let listener = bind_strict(config.bind).await?;
    info!("Gate listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(ct.cancelled_owned())
        .await?;

    info!("Gate stopped");
    Ok(())
}

/// Serve the router until Ctrl+C
pub async fn run_http_blocking(router: Router, config: HttpConfig) -> Result<(), TransportError> {
    let ct = CancellationToken::new();
    let mut server = tokio::spawn(run_http(router, config, ct.clone()));

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            ct.cancel();
        }
        joined = &mut server => {
            // Server exited on its own (e.g. bind failure)
            return flatten(joined);
        }
    }

    flatten(server.await)
}

fn flatten(
    joined: Result<Result<(), TransportError>, tokio::task::JoinError>,
) -> Result<(), TransportError> {
    joined.map_err(|e| TransportError::Io(std::io::Error::other(e)))?
}
