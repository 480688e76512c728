//! Upstream forwarding
//!
//! Requests the gate lets through are streamed to the presentation app and
//! its response is streamed back unchanged.

use crate::config::UpstreamConfig;
use crate::error::TransportError;
use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, header};
use axum::response::Response;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection-scoped headers that must not be forwarded (RFC 9110 §7.6.1)
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Streams requests to the upstream app
#[derive(Clone)]
pub struct UpstreamProxy {
    http: Client,
    base_url: String,
}

impl UpstreamProxy {
    pub fn new(config: &UpstreamConfig) -> Result<Self, TransportError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(TransportError::InvalidUpstream(config.url.clone()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            // Upstream redirects belong to the browser
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Forward `request` and return the upstream response
    #[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
    pub async fn forward(&self, request: Request) -> Result<Response, TransportError> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        if let Some(host) = headers.remove(header::HOST) {
            headers.insert(X_FORWARDED_HOST, host);
        }

        let mut upstream = self.http.request(parts.method, &url).headers(headers);
        if body.size_hint().exact() != Some(0) {
            upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = upstream.send().await?;
        debug!(status = upstream.status().as_u16(), "Upstream responded");

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    // keep-alive is not in the standard header constants
    headers.remove("keep-alive");
}
