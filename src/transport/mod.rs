//! Transport module
//!
//! HTTP front of the gate: router, cookie handling and upstream forwarding.

pub mod cookies;
pub mod http;
pub mod proxy;

pub use cookies::SessionCookies;
pub use http::{
    DEFAULT_HTTP_PORT, GateState, HttpConfig, access_gate, build_router, run_http,
    run_http_blocking,
};
pub use proxy::UpstreamProxy;
